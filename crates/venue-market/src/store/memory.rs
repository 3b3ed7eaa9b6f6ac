//! In-process store honouring the same constraints as the PostgreSQL schema:
//! one pending application per user, applicants and reviewers must exist,
//! deleting a user cascades to their applications, and review writes become
//! visible only on commit.
//!
//! A review transaction holds the store lock from `begin_review` until it is
//! committed or dropped, so transactions are fully serialised.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::RepositoryError;
use crate::identity::{Role, UserId};
use crate::workflows::accounts::{
    ProfileChanges, SeedUser, UserProfile, UserRepository, DEFAULT_LOCALE,
};
use crate::workflows::host_applications::{
    ApplicationId, ApplicationStatus, HostApplication, HostApplicationRepository,
    NewHostApplication, ReviewTransaction, ReviewTransition,
};

/// Failure to inject into the next review transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFault {
    /// The applicant's role write fails after the status write succeeded.
    RoleWrite,
    /// Every write succeeds but the commit itself fails.
    Commit,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, UserProfile>,
    applications: BTreeMap<ApplicationId, HostApplication>,
    last_user_id: i64,
    last_application_id: i64,
    review_fault: Option<ReviewFault>,
}

impl MemoryState {
    fn newest<'a, I>(applications: I) -> Option<HostApplication>
    where
        I: Iterator<Item = &'a HostApplication>,
    {
        applications
            .max_by_key(|application| (application.created_at, application.id))
            .cloned()
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user row and return its profile.
    pub async fn insert_user(&self, email: &str, role: Role) -> UserProfile {
        let mut state = self.state.lock().await;
        state.last_user_id += 1;
        let now = Utc::now();
        let profile = UserProfile {
            id: UserId(state.last_user_id),
            email: email.to_string(),
            full_name: None,
            role,
            locale: DEFAULT_LOCALE.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(profile.id, profile.clone());
        profile
    }

    pub async fn role_of(&self, user_id: UserId) -> Option<Role> {
        self.state
            .lock()
            .await
            .users
            .get(&user_id)
            .map(|user| user.role)
    }

    /// Change a role out of band, as admin tooling would.
    pub async fn set_role(&self, user_id: UserId, role: Role) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Arrange for the next review transaction to fail at `fault`.
    pub async fn inject_review_fault(&self, fault: ReviewFault) {
        self.state.lock().await.review_fault = Some(fault);
    }

    pub async fn application_count(&self) -> usize {
        self.state.lock().await.applications.len()
    }
}

#[async_trait]
impl HostApplicationRepository for MemoryStore {
    async fn create(
        &self,
        user_id: UserId,
        application: &NewHostApplication,
    ) -> Result<HostApplication, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user_id) {
            return Err(RepositoryError::ReferenceViolation);
        }
        let has_pending = state
            .applications
            .values()
            .any(|existing| existing.user_id == user_id && existing.is_pending());
        if has_pending {
            return Err(RepositoryError::Conflict);
        }

        state.last_application_id += 1;
        let now = Utc::now();
        let created = HostApplication {
            id: ApplicationId(state.last_application_id),
            user_id,
            offering_type: application.offering_type,
            space_types: application.space_types.clone(),
            categories: application.categories.clone(),
            capacity: application.capacity,
            notes: application.notes.clone(),
            status: ApplicationStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            created_at: now,
            updated_at: now,
        };
        state.applications.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_pending_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(MemoryState::newest(state.applications.values().filter(
            |application| application.user_id == user_id && application.is_pending(),
        )))
    }

    async fn find_latest_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(MemoryState::newest(
            state
                .applications
                .values()
                .filter(|application| application.user_id == user_id),
        ))
    }

    async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, RepositoryError> {
        let state = self.state.lock().await;
        let mut matching: Vec<HostApplication> = state
            .applications
            .values()
            .filter(|application| application.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|application| (application.created_at, application.id));
        Ok(matching)
    }

    async fn get_by_id(&self, id: ApplicationId) -> Result<Option<HostApplication>, RepositoryError> {
        Ok(self.state.lock().await.applications.get(&id).cloned())
    }

    async fn begin_review(&self) -> Result<Box<dyn ReviewTransaction>, RepositoryError> {
        let mut state = Arc::clone(&self.state).lock_owned().await;
        let fault = state.review_fault.take();
        Ok(Box::new(MemoryReviewTransaction {
            state,
            staged_applications: BTreeMap::new(),
            staged_roles: BTreeMap::new(),
            fault,
        }))
    }
}

struct MemoryReviewTransaction {
    state: OwnedMutexGuard<MemoryState>,
    staged_applications: BTreeMap<ApplicationId, HostApplication>,
    staged_roles: BTreeMap<UserId, Role>,
    fault: Option<ReviewFault>,
}

impl MemoryReviewTransaction {
    fn current_application(&self, id: ApplicationId) -> Option<&HostApplication> {
        self.staged_applications
            .get(&id)
            .or_else(|| self.state.applications.get(&id))
    }

    fn current_role(&self, user_id: UserId) -> Option<Role> {
        self.staged_roles
            .get(&user_id)
            .copied()
            .or_else(|| self.state.users.get(&user_id).map(|user| user.role))
    }

    fn injected(fault: ReviewFault) -> RepositoryError {
        RepositoryError::Unavailable(format!("injected fault: {fault:?}"))
    }
}

#[async_trait]
impl ReviewTransaction for MemoryReviewTransaction {
    async fn update_on_review(
        &mut self,
        id: ApplicationId,
        transition: &ReviewTransition,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        if !self.state.users.contains_key(&transition.reviewed_by) {
            return Err(RepositoryError::ReferenceViolation);
        }
        let reviewed = match self.current_application(id) {
            Some(application) if application.is_pending() => transition.apply_to(application),
            _ => return Ok(None),
        };
        self.staged_applications.insert(id, reviewed.clone());
        Ok(Some(reviewed))
    }

    async fn user_role(&mut self, user_id: UserId) -> Result<Option<Role>, RepositoryError> {
        Ok(self.current_role(user_id))
    }

    async fn promote_user(
        &mut self,
        user_id: UserId,
        from: Role,
        to: Role,
    ) -> Result<bool, RepositoryError> {
        if self.fault == Some(ReviewFault::RoleWrite) {
            return Err(Self::injected(ReviewFault::RoleWrite));
        }
        if self.current_role(user_id) != Some(from) {
            return Ok(false);
        }
        self.staged_roles.insert(user_id, to);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryReviewTransaction {
            mut state,
            staged_applications,
            staged_roles,
            fault,
        } = *self;

        if fault == Some(ReviewFault::Commit) {
            return Err(Self::injected(ReviewFault::Commit));
        }

        let now = Utc::now();
        for (user_id, role) in staged_roles {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.role = role;
                user.updated_at = now;
            }
        }
        state.applications.extend(staged_applications);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(full_name) = &changes.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(locale) = &changes.locale {
            user.locale = locale.clone();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn upsert_with_role(&self, seed: &SeedUser) -> Result<UserProfile, RepositoryError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(existing) = state
            .users
            .values_mut()
            .find(|user| user.email == seed.email)
        {
            existing.role = seed.role;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        state.last_user_id += 1;
        let profile = UserProfile {
            id: UserId(state.last_user_id),
            email: seed.email.clone(),
            full_name: Some(seed.full_name.clone()),
            role: seed.role,
            locale: seed.locale.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&id) {
            return Ok(false);
        }
        let reviewer_of_record = state
            .applications
            .values()
            .any(|application| application.reviewed_by == Some(id));
        if reviewer_of_record {
            return Err(RepositoryError::ReferenceViolation);
        }
        state.users.remove(&id);
        state.applications.retain(|_, application| application.user_id != id);
        Ok(true)
    }
}
