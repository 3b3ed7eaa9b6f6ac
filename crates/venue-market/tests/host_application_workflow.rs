//! End-to-end host onboarding through the public routers: a user applies, an
//! admin works the review queue, and the approval shows up on the user's
//! profile as the `host` role.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use serde_json::Value;

    use venue_market::identity::{Actor, USER_ID_HEADER, USER_ROLE_HEADER};
    use venue_market::store::MemoryStore;
    use venue_market::workflows::accounts::{account_router, AccountService};
    use venue_market::workflows::host_applications::{
        host_application_router, HostApplicationService,
    };

    pub(super) fn app(store: &Arc<MemoryStore>) -> Router {
        host_application_router(Arc::new(HostApplicationService::new(Arc::clone(store))))
            .merge(account_router(Arc::new(AccountService::new(Arc::clone(store)))))
    }

    pub(super) fn call(method: &str, uri: &str, actor: &Actor, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, actor.id.to_string())
            .header(USER_ROLE_HEADER, actor.role.label());
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    pub(super) async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }
}

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{app, call, read_json};
use venue_market::identity::{Actor, Role};
use venue_market::store::MemoryStore;

#[tokio::test]
async fn approval_promotes_applicant_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let user = store.insert_user("dancer@yourplace.dev", Role::User).await;
    let admin = store.insert_user("admin@yourplace.dev", Role::Admin).await;
    let user = Actor::new(user.id, user.role);
    let admin = Actor::new(admin.id, admin.role);
    let app = app(&store);

    let submission = json!({ "offeringType": "both", "categories": ["movement"], "capacity": 10 });
    let created = app
        .clone()
        .oneshot(call("POST", "/api/v1/host-applications", &user, Some(submission.clone())))
        .await
        .expect("response");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = read_json(created).await;
    assert_eq!(created["data"]["status"], "pending");
    assert_eq!(created["data"]["user_id"], user.id.0);
    assert_eq!(created["data"]["notes"], "");
    let application_id = created["data"]["id"].as_i64().expect("numeric id");

    let duplicate = app
        .clone()
        .oneshot(call("POST", "/api/v1/host-applications", &user, Some(submission)))
        .await
        .expect("response");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let review_uri = format!("/api/v1/host-applications/{application_id}");
    let approved = app
        .clone()
        .oneshot(call(
            "PATCH",
            &review_uri,
            &admin,
            Some(json!({ "status": "approved", "reviewNotes": "looks good" })),
        ))
        .await
        .expect("response");
    assert_eq!(approved.status(), StatusCode::OK);
    let approved = read_json(approved).await;
    assert_eq!(approved["data"]["status"], "approved");
    assert_eq!(approved["data"]["reviewed_by"], admin.id.0);

    let profile = app
        .clone()
        .oneshot(call("GET", "/api/v1/users/me", &user, None))
        .await
        .expect("response");
    assert_eq!(profile.status(), StatusCode::OK);
    assert_eq!(read_json(profile).await["data"]["role"], "host");

    let again = app
        .clone()
        .oneshot(call(
            "PATCH",
            &review_uri,
            &admin,
            Some(json!({ "status": "rejected" })),
        ))
        .await
        .expect("response");
    assert_eq!(again.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(again).await["error"]["code"], "CONFLICT");

    let latest = app
        .oneshot(call("GET", "/api/v1/host-applications/me", &user, None))
        .await
        .expect("response");
    let latest = read_json(latest).await;
    assert_eq!(latest["data"]["status"], "approved");
    assert_eq!(latest["data"]["review_notes"], "looks good");
    assert_eq!(store.role_of(user.id).await, Some(Role::Host));
}

#[tokio::test]
async fn review_queue_is_admin_only_and_first_in_first_out() {
    let store = Arc::new(MemoryStore::new());
    let first = store.insert_user("first@yourplace.dev", Role::User).await;
    let second = store.insert_user("second@yourplace.dev", Role::User).await;
    let admin = store.insert_user("admin@yourplace.dev", Role::Admin).await;
    let first = Actor::new(first.id, first.role);
    let second = Actor::new(second.id, second.role);
    let admin = Actor::new(admin.id, admin.role);
    let app = app(&store);

    for applicant in [&first, &second] {
        let response = app
            .clone()
            .oneshot(call(
                "POST",
                "/api/v1/host-applications",
                applicant,
                Some(json!({ "offeringType": "space", "spaceTypes": ["studio"], "categories": ["yoga"], "capacity": 12 })),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let forbidden = app
        .clone()
        .oneshot(call("GET", "/api/v1/host-applications", &first, None))
        .await
        .expect("response");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let queue = app
        .clone()
        .oneshot(call("GET", "/api/v1/host-applications?status=pending", &admin, None))
        .await
        .expect("response");
    assert_eq!(queue.status(), StatusCode::OK);
    let queue = read_json(queue).await;
    let owners: Vec<i64> = queue["data"]
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["user_id"].as_i64().expect("user id"))
        .collect();
    assert_eq!(owners, vec![first.id.0, second.id.0]);

    let rejected = app
        .oneshot(call("GET", "/api/v1/host-applications?status=rejected", &admin, None))
        .await
        .expect("response");
    assert_eq!(read_json(rejected).await["data"], json!([]));
}
