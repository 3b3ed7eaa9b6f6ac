use async_trait::async_trait;

use super::domain::{ApplicationId, ApplicationStatus, HostApplication, NewHostApplication};
use super::transition::ReviewTransition;
use crate::identity::{Role, UserId};
pub use crate::store::RepositoryError;

/// Storage abstraction over `host_applications` so the lifecycle engine can be
/// exercised against PostgreSQL or the in-memory store.
#[async_trait]
pub trait HostApplicationRepository: Send + Sync {
    /// Insert a pending application. Violating the one-pending-per-user
    /// constraint yields [`RepositoryError::Conflict`]; an unknown user yields
    /// [`RepositoryError::ReferenceViolation`].
    async fn create(
        &self,
        user_id: UserId,
        application: &NewHostApplication,
    ) -> Result<HostApplication, RepositoryError>;

    /// Newest pending application for the user, if any.
    async fn find_pending_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError>;

    /// Newest application for the user regardless of status.
    async fn find_latest_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError>;

    /// Applications in `status`, oldest first.
    async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, RepositoryError>;

    async fn get_by_id(&self, id: ApplicationId) -> Result<Option<HostApplication>, RepositoryError>;

    /// Open the transaction a review is applied in.
    async fn begin_review(&self) -> Result<Box<dyn ReviewTransaction>, RepositoryError>;
}

/// Unit of work spanning the application status write and the applicant's
/// role write. Dropping it without `commit` discards every write.
#[async_trait]
pub trait ReviewTransaction: Send {
    /// Record the review, but only while the row is still pending. `None`
    /// means the application is unknown or another reviewer got there first.
    async fn update_on_review(
        &mut self,
        id: ApplicationId,
        transition: &ReviewTransition,
    ) -> Result<Option<HostApplication>, RepositoryError>;

    /// Current role of the user, read inside the transaction.
    async fn user_role(&mut self, user_id: UserId) -> Result<Option<Role>, RepositoryError>;

    /// Move the user from `from` to `to`. Returns `false` when the stored role
    /// is no longer `from`.
    async fn promote_user(
        &mut self,
        user_id: UserId,
        from: Role,
        to: Role,
    ) -> Result<bool, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}
