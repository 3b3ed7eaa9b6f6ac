use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::access;
use super::domain::{
    ApplicationId, ApplicationStatus, HostApplication, NewHostApplication, ReviewCommand,
};
use super::repository::{HostApplicationRepository, RepositoryError, ReviewTransaction};
use super::transition::{self, AlreadyReviewed, ReviewTransition, RoleChange};
pub use crate::error::ErrorKind;
use crate::identity::{Actor, UserId};

/// Lifecycle engine for host applications: submission, lookup, admin listing,
/// and the transactional review that promotes approved applicants.
pub struct HostApplicationService<R> {
    repository: Arc<R>,
}

impl<R> HostApplicationService<R>
where
    R: HostApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Submit a new application on behalf of `actor`.
    pub async fn submit(
        &self,
        actor: Option<&Actor>,
        application: NewHostApplication,
    ) -> Result<HostApplication, LifecycleError> {
        let actor = access::authenticated(actor)?;
        access::ensure_may_apply(actor)?;

        if let Some(pending) = self.repository.find_pending_by_user(actor.id).await? {
            debug!(user_id = %actor.id, application_id = %pending.id, "pending application already on file");
            return Err(LifecycleError::PendingApplicationExists);
        }

        // The partial unique index catches submissions that raced past the check above.
        let created = match self.repository.create(actor.id, &application).await {
            Ok(created) => created,
            Err(RepositoryError::Conflict) => return Err(LifecycleError::PendingApplicationExists),
            Err(RepositoryError::ReferenceViolation) => {
                return Err(LifecycleError::ApplicantAccountMissing(actor.id))
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            user_id = %actor.id,
            application_id = %created.id,
            offering_type = created.offering_type.label(),
            "host application submitted"
        );
        Ok(created)
    }

    /// The actor's most recent application in any status.
    pub async fn get_latest(&self, actor: Option<&Actor>) -> Result<HostApplication, LifecycleError> {
        let actor = access::authenticated(actor)?;
        self.repository
            .find_latest_by_user(actor.id)
            .await?
            .ok_or(LifecycleError::NoApplication)
    }

    /// Admin review queue, oldest first.
    pub async fn list(
        &self,
        actor: Option<&Actor>,
        status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, LifecycleError> {
        let actor = access::authenticated(actor)?;
        access::require_admin(actor)?;
        Ok(self.repository.list_by_status(status).await?)
    }

    /// Record an admin decision. The status write and any promotion commit
    /// together or not at all.
    pub async fn review(
        &self,
        actor: Option<&Actor>,
        application_id: ApplicationId,
        command: ReviewCommand,
    ) -> Result<HostApplication, LifecycleError> {
        let actor = access::authenticated(actor)?;
        access::require_admin(actor)?;

        let existing = self
            .repository
            .get_by_id(application_id)
            .await?
            .ok_or(LifecycleError::ApplicationNotFound(application_id))?;

        let ReviewCommand {
            decision,
            review_notes,
        } = command;
        let planned = transition::plan_review(&existing, actor, decision, review_notes, Utc::now())?;

        let mut tx = self.repository.begin_review().await?;
        let applied = apply_review(tx.as_mut(), &planned).await;
        match applied {
            Ok((reviewed, role_change)) => {
                tx.commit().await?;
                info!(
                    application_id = %reviewed.id,
                    applicant = %reviewed.user_id,
                    reviewer = %actor.id,
                    status = reviewed.status.label(),
                    promoted = matches!(role_change, RoleChange::Promote { .. }),
                    "host application reviewed"
                );
                Ok(reviewed)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        application_id = %application_id,
                        error = %rollback_err,
                        "rollback after failed review did not complete"
                    );
                }
                warn!(application_id = %application_id, error = %err, "host application review rolled back");
                Err(err)
            }
        }
    }
}

/// Steps executed inside the review transaction: status first, then the
/// conditional promotion.
async fn apply_review(
    tx: &mut dyn ReviewTransaction,
    planned: &ReviewTransition,
) -> Result<(HostApplication, RoleChange), LifecycleError> {
    let reviewed = match tx.update_on_review(planned.application_id, planned).await {
        Ok(Some(reviewed)) => reviewed,
        Ok(None) => return Err(LifecycleError::ConcurrentReview(planned.application_id)),
        Err(RepositoryError::ReferenceViolation) => {
            return Err(LifecycleError::ReviewerAccountMissing(planned.reviewed_by))
        }
        Err(err) => return Err(err.into()),
    };

    let role_change = match planned.decision.status() {
        ApplicationStatus::Approved => {
            let role = tx.user_role(planned.applicant).await?;
            transition::promotion_for(planned.decision, role)
        }
        _ => RoleChange::Unchanged,
    };

    if let RoleChange::Promote { from, to } = role_change {
        let promoted = tx.promote_user(planned.applicant, from, to).await?;
        if !promoted {
            debug!(user_id = %planned.applicant, "role changed before promotion; left as is");
            return Ok((reviewed, RoleChange::Unchanged));
        }
    }

    Ok((reviewed, role_change))
}

/// Error raised by the host application lifecycle engine.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("admin only")]
    AdminOnly,
    #[error("you are already a host")]
    AlreadyHost,
    #[error("admins do not need host applications")]
    AdminExempt,
    #[error("you already have a pending host application")]
    PendingApplicationExists,
    #[error("application has already been reviewed")]
    AlreadyReviewed(#[from] AlreadyReviewed),
    #[error("application {0} was reviewed concurrently")]
    ConcurrentReview(ApplicationId),
    #[error("no host application found")]
    NoApplication,
    #[error("host application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("no user account exists for applicant {0}")]
    ApplicantAccountMissing(UserId),
    #[error("no user account exists for reviewer {0}")]
    ReviewerAccountMissing(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::Unauthenticated => ErrorKind::Unauthenticated,
            LifecycleError::AdminOnly => ErrorKind::Forbidden,
            LifecycleError::AlreadyHost
            | LifecycleError::AdminExempt
            | LifecycleError::PendingApplicationExists
            | LifecycleError::AlreadyReviewed(_)
            | LifecycleError::ConcurrentReview(_) => ErrorKind::Conflict,
            LifecycleError::NoApplication
            | LifecycleError::ApplicationNotFound(_)
            | LifecycleError::ApplicantAccountMissing(_)
            | LifecycleError::ReviewerAccountMissing(_) => ErrorKind::NotFound,
            LifecycleError::Repository(RepositoryError::Conflict) => ErrorKind::Conflict,
            LifecycleError::Repository(
                RepositoryError::NotFound | RepositoryError::ReferenceViolation,
            ) => ErrorKind::NotFound,
            LifecycleError::Repository(_) => ErrorKind::Infrastructure,
        }
    }
}
