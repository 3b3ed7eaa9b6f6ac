use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use venue_market::workflows::accounts::{account_router, AccountService, UserRepository};
use venue_market::workflows::host_applications::{
    host_application_router, HostApplicationRepository, HostApplicationService,
};

pub(crate) fn with_platform_routes<H, U>(
    host_applications: Arc<HostApplicationService<H>>,
    accounts: Arc<AccountService<U>>,
) -> Router
where
    H: HostApplicationRepository + 'static,
    U: UserRepository + 'static,
{
    host_application_router(host_applications)
        .merge(account_router(accounts))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;
    use venue_market::store::MemoryStore;

    fn app(readiness: Arc<AtomicBool>) -> Router {
        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_platform_routes(
            Arc::new(HostApplicationService::new(Arc::clone(&store))),
            Arc::new(AccountService::new(store)),
        )
        .layer(Extension(state))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let readiness = Arc::new(AtomicBool::new(false));
        let router = app(Arc::clone(&readiness));

        let starting = router
            .clone()
            .oneshot(get_request("/ready"))
            .await
            .expect("response");
        assert_eq!(starting.status(), StatusCode::SERVICE_UNAVAILABLE);

        readiness.store(true, Ordering::Release);
        let ready = router
            .oneshot(get_request("/ready"))
            .await
            .expect("response");
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn workflow_routes_are_mounted() {
        let router = app(Arc::new(AtomicBool::new(true)));

        let health = router
            .clone()
            .oneshot(get_request("/health"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let profile = router
            .clone()
            .oneshot(get_request("/api/v1/users/me"))
            .await
            .expect("response");
        assert_eq!(profile.status(), StatusCode::UNAUTHORIZED);

        let queue = router
            .oneshot(get_request("/api/v1/host-applications"))
            .await
            .expect("response");
        assert_eq!(queue.status(), StatusCode::UNAUTHORIZED);
    }
}
