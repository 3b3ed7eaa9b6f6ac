//! Pure review state transition.
//!
//! The engine decides everything about a review here, then applies the
//! result inside a [`ReviewTransaction`](super::repository::ReviewTransaction).
//! Nothing in this module touches the store, so every rule can be checked
//! without one.

use chrono::{DateTime, Utc};

use super::domain::{ApplicationId, ApplicationStatus, HostApplication, ReviewDecision};
use crate::identity::{Actor, Role, UserId};

/// The review fields to stamp onto a pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTransition {
    pub application_id: ApplicationId,
    pub applicant: UserId,
    pub decision: ReviewDecision,
    pub reviewed_by: UserId,
    pub reviewed_at: DateTime<Utc>,
    pub review_notes: String,
}

impl ReviewTransition {
    pub const fn status(&self) -> ApplicationStatus {
        self.decision.status()
    }

    /// Apply the transition to an in-memory copy of the row.
    pub fn apply_to(&self, application: &HostApplication) -> HostApplication {
        HostApplication {
            status: self.status(),
            reviewed_by: Some(self.reviewed_by),
            reviewed_at: Some(self.reviewed_at),
            review_notes: Some(self.review_notes.clone()),
            updated_at: self.reviewed_at,
            ..application.clone()
        }
    }
}

/// Role write implied by a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Promote { from: Role, to: Role },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("application {id} has already been reviewed ({status})")]
pub struct AlreadyReviewed {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
}

/// Plan the review of `application`. Only pending applications may be
/// reviewed; a second review is rejected rather than treated as a no-op.
pub fn plan_review(
    application: &HostApplication,
    reviewer: &Actor,
    decision: ReviewDecision,
    review_notes: String,
    now: DateTime<Utc>,
) -> Result<ReviewTransition, AlreadyReviewed> {
    if application.status.is_terminal() {
        return Err(AlreadyReviewed {
            id: application.id,
            status: application.status,
        });
    }

    Ok(ReviewTransition {
        application_id: application.id,
        applicant: application.user_id,
        decision,
        reviewed_by: reviewer.id,
        reviewed_at: now,
        review_notes,
    })
}

/// Promotion only ever moves a plain `user` to `host`. Hosts, admins, and
/// users whose row has vanished are left alone.
pub fn promotion_for(decision: ReviewDecision, applicant_role: Option<Role>) -> RoleChange {
    match (decision, applicant_role) {
        (ReviewDecision::Approved, Some(Role::User)) => RoleChange::Promote {
            from: Role::User,
            to: Role::Host,
        },
        _ => RoleChange::Unchanged,
    }
}
