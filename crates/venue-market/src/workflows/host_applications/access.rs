use super::service::LifecycleError;
use crate::identity::{Actor, Role};

pub fn authenticated(actor: Option<&Actor>) -> Result<&Actor, LifecycleError> {
    actor.ok_or(LifecycleError::Unauthenticated)
}

pub fn require_admin(actor: &Actor) -> Result<(), LifecycleError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(LifecycleError::AdminOnly)
    }
}

/// Hosts and admins already hold the privileges an application grants.
pub fn ensure_may_apply(actor: &Actor) -> Result<(), LifecycleError> {
    match actor.role {
        Role::User => Ok(()),
        Role::Host => Err(LifecycleError::AlreadyHost),
        Role::Admin => Err(LifecycleError::AdminExempt),
    }
}
