use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;

use super::domain::{ProfileChanges, ProfileUpdateRequest};
use super::repository::UserRepository;
use super::service::{AccountError, AccountService};
use crate::error::ErrorKind;
use crate::http::{data_response, kind_failure, validation_failure};
use crate::identity::ActorIdentity;

/// Router builder exposing the caller's own profile.
pub fn account_router<R>(service: Arc<AccountService<R>>) -> Router
where
    R: UserRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/me",
            get(me_handler::<R>)
                .patch(update_me_handler::<R>)
                .delete(delete_me_handler::<R>),
        )
        .with_state(service)
}

async fn me_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    identity: ActorIdentity,
) -> Response
where
    R: UserRepository + 'static,
{
    match service.me(identity.actor()).await {
        Ok(profile) => data_response(StatusCode::OK, profile),
        Err(err) => account_failure(&err),
    }
}

async fn update_me_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    identity: ActorIdentity,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Response
where
    R: UserRepository + 'static,
{
    let Some(actor) = identity.actor() else {
        return account_failure(&AccountError::Unauthenticated);
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return validation_failure(rejection.body_text()),
    };
    let changes = match ProfileChanges::try_from(request) {
        Ok(changes) => changes,
        Err(err) => return validation_failure(err.to_string()),
    };

    match service.update_me(Some(actor), changes).await {
        Ok(profile) => data_response(StatusCode::OK, profile),
        Err(err) => account_failure(&err),
    }
}

async fn delete_me_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    identity: ActorIdentity,
) -> Response
where
    R: UserRepository + 'static,
{
    match service.delete_me(identity.actor()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => account_failure(&err),
    }
}

fn account_failure(err: &AccountError) -> Response {
    let kind = err.kind();
    if kind == ErrorKind::Infrastructure {
        error!(error = %err, "account request failed");
        return kind_failure(kind, "internal server error");
    }
    kind_failure(kind, err.to_string())
}
