//! Host application lifecycle: submission, lookup, the admin review queue,
//! and the review transaction that promotes approved applicants to `host`.

pub mod access;
pub mod domain;
pub mod intake;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, HostApplication, HostApplicationSubmission, ListQuery,
    NewHostApplication, OfferingType, ReviewCommand, ReviewDecision, ReviewRequest, UnknownLabel,
};
pub use intake::{SubmissionGuard, ValidationError, MAX_NOTES_CHARS};
pub use repository::{HostApplicationRepository, RepositoryError, ReviewTransaction};
pub use router::host_application_router;
pub use service::{ErrorKind, HostApplicationService, LifecycleError};
pub use transition::{plan_review, promotion_for, AlreadyReviewed, ReviewTransition, RoleChange};
