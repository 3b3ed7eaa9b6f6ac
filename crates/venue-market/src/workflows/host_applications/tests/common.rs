use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::identity::{Actor, Role, UserId, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::store::MemoryStore;
use crate::workflows::host_applications::{
    ApplicationId, ApplicationStatus, HostApplication, HostApplicationRepository,
    HostApplicationService, HostApplicationSubmission, NewHostApplication, OfferingType,
    RepositoryError, ReviewCommand, ReviewDecision, ReviewTransaction,
};

pub(super) struct Fixture {
    pub(super) store: Arc<MemoryStore>,
    pub(super) service: Arc<HostApplicationService<MemoryStore>>,
    pub(super) applicant: Actor,
    pub(super) admin: Actor,
    pub(super) host: Actor,
}

pub(super) async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let applicant = store.insert_user("applicant@yourplace.dev", Role::User).await;
    let admin = store.insert_user("admin@yourplace.dev", Role::Admin).await;
    let host = store.insert_user("host@yourplace.dev", Role::Host).await;
    let service = Arc::new(HostApplicationService::new(Arc::clone(&store)));

    Fixture {
        store,
        service,
        applicant: Actor::new(applicant.id, applicant.role),
        admin: Actor::new(admin.id, admin.role),
        host: Actor::new(host.id, host.role),
    }
}

pub(super) fn submission() -> HostApplicationSubmission {
    HostApplicationSubmission {
        offering_type: "space".to_string(),
        space_types: Some(vec!["loft".to_string()]),
        categories: vec!["music".to_string()],
        capacity: 40,
        notes: None,
    }
}

pub(super) fn new_application() -> NewHostApplication {
    NewHostApplication {
        offering_type: OfferingType::Space,
        space_types: vec!["loft".to_string()],
        categories: vec!["music".to_string()],
        capacity: 40,
        notes: String::new(),
    }
}

pub(super) fn approve(notes: &str) -> ReviewCommand {
    ReviewCommand {
        decision: ReviewDecision::Approved,
        review_notes: notes.to_string(),
    }
}

pub(super) fn reject(notes: &str) -> ReviewCommand {
    ReviewCommand {
        decision: ReviewDecision::Rejected,
        review_notes: notes.to_string(),
    }
}

/// Store whose every call fails as if the database were offline.
pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

#[async_trait]
impl HostApplicationRepository for UnavailableRepository {
    async fn create(
        &self,
        _user_id: UserId,
        _application: &NewHostApplication,
    ) -> Result<HostApplication, RepositoryError> {
        Err(offline())
    }

    async fn find_pending_by_user(
        &self,
        _user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        Err(offline())
    }

    async fn find_latest_by_user(
        &self,
        _user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        Err(offline())
    }

    async fn list_by_status(
        &self,
        _status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, RepositoryError> {
        Err(offline())
    }

    async fn get_by_id(&self, _id: ApplicationId) -> Result<Option<HostApplication>, RepositoryError> {
        Err(offline())
    }

    async fn begin_review(&self) -> Result<Box<dyn ReviewTransaction>, RepositoryError> {
        Err(offline())
    }
}

/// Store that reports no pending application but rejects every insert on the
/// unique index, as a racing submission would.
pub(super) struct RacingRepository;

#[async_trait]
impl HostApplicationRepository for RacingRepository {
    async fn create(
        &self,
        _user_id: UserId,
        _application: &NewHostApplication,
    ) -> Result<HostApplication, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    async fn find_pending_by_user(
        &self,
        _user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        Ok(None)
    }

    async fn find_latest_by_user(
        &self,
        _user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        Ok(None)
    }

    async fn list_by_status(
        &self,
        _status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn get_by_id(&self, _id: ApplicationId) -> Result<Option<HostApplication>, RepositoryError> {
        Ok(None)
    }

    async fn begin_review(&self) -> Result<Box<dyn ReviewTransaction>, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

/// Store that serves a snapshot taken before another admin's review landed,
/// so the engine plans against a pending row the database no longer holds.
pub(super) struct StaleSnapshotRepository {
    pub(super) store: Arc<MemoryStore>,
    pub(super) snapshot: HostApplication,
}

#[async_trait]
impl HostApplicationRepository for StaleSnapshotRepository {
    async fn create(
        &self,
        user_id: UserId,
        application: &NewHostApplication,
    ) -> Result<HostApplication, RepositoryError> {
        self.store.create(user_id, application).await
    }

    async fn find_pending_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        self.store.find_pending_by_user(user_id).await
    }

    async fn find_latest_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        self.store.find_latest_by_user(user_id).await
    }

    async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, RepositoryError> {
        self.store.list_by_status(status).await
    }

    async fn get_by_id(&self, id: ApplicationId) -> Result<Option<HostApplication>, RepositoryError> {
        Ok((self.snapshot.id == id).then(|| self.snapshot.clone()))
    }

    async fn begin_review(&self) -> Result<Box<dyn ReviewTransaction>, RepositoryError> {
        self.store.begin_review().await
    }
}

pub(super) fn request(
    method: &str,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header(USER_ID_HEADER, actor.id.to_string())
            .header(USER_ROLE_HEADER, actor.role.label());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
