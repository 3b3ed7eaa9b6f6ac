use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::error;

use super::access;
use super::domain::{HostApplicationSubmission, ListQuery, ReviewRequest};
use super::intake::SubmissionGuard;
use super::repository::HostApplicationRepository;
use super::service::{ErrorKind, HostApplicationService, LifecycleError};
use crate::http::{data_response, kind_failure, validation_failure};
use crate::identity::{Actor, ActorIdentity};

/// Router builder exposing the host application endpoints.
pub fn host_application_router<R>(service: Arc<HostApplicationService<R>>) -> Router
where
    R: HostApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/host-applications",
            post(submit_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/host-applications/me", get(latest_handler::<R>))
        .route(
            "/api/v1/host-applications/:application_id",
            patch(review_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<HostApplicationService<R>>>,
    identity: ActorIdentity,
    payload: Result<Json<HostApplicationSubmission>, JsonRejection>,
) -> Response
where
    R: HostApplicationRepository + 'static,
{
    let actor = match gate(&identity, false) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => return validation_failure(rejection.body_text()),
    };
    let application = match SubmissionGuard.validate_submission(submission) {
        Ok(application) => application,
        Err(err) => return validation_failure(err.to_string()),
    };

    match service.submit(Some(actor), application).await {
        Ok(created) => data_response(StatusCode::CREATED, created),
        Err(err) => lifecycle_failure(&err),
    }
}

pub(crate) async fn latest_handler<R>(
    State(service): State<Arc<HostApplicationService<R>>>,
    identity: ActorIdentity,
) -> Response
where
    R: HostApplicationRepository + 'static,
{
    match service.get_latest(identity.actor()).await {
        Ok(latest) => data_response(StatusCode::OK, latest),
        Err(err) => lifecycle_failure(&err),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<HostApplicationService<R>>>,
    identity: ActorIdentity,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    R: HostApplicationRepository + 'static,
{
    let actor = match gate(&identity, true) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return validation_failure(rejection.body_text()),
    };
    let status = match SubmissionGuard.validate_list_query(query) {
        Ok(status) => status,
        Err(err) => return validation_failure(err.to_string()),
    };

    match service.list(Some(actor), status).await {
        Ok(applications) => data_response(StatusCode::OK, applications),
        Err(err) => lifecycle_failure(&err),
    }
}

pub(crate) async fn review_handler<R>(
    State(service): State<Arc<HostApplicationService<R>>>,
    identity: ActorIdentity,
    Path(application_id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Response
where
    R: HostApplicationRepository + 'static,
{
    let actor = match gate(&identity, true) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let application_id = match SubmissionGuard.validate_application_id(&application_id) {
        Ok(id) => id,
        Err(err) => return validation_failure(err.to_string()),
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return validation_failure(rejection.body_text()),
    };
    let command = match SubmissionGuard.validate_review(request) {
        Ok(command) => command,
        Err(err) => return validation_failure(err.to_string()),
    };

    match service.review(Some(actor), application_id, command).await {
        Ok(reviewed) => data_response(StatusCode::OK, reviewed),
        Err(err) => lifecycle_failure(&err),
    }
}

/// Identity and admin checks run ahead of payload validation.
fn gate(identity: &ActorIdentity, admin_only: bool) -> Result<&Actor, Response> {
    let actor = access::authenticated(identity.actor()).map_err(|err| lifecycle_failure(&err))?;
    if admin_only {
        access::require_admin(actor).map_err(|err| lifecycle_failure(&err))?;
    }
    Ok(actor)
}

pub(crate) fn lifecycle_failure(err: &LifecycleError) -> Response {
    let kind = err.kind();
    if kind == ErrorKind::Infrastructure {
        error!(error = %err, "host application request failed");
        return kind_failure(kind, "internal server error");
    }
    kind_failure(kind, err.to_string())
}
