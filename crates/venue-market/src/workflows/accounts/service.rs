use std::sync::Arc;

use tracing::info;

use super::domain::{ProfileChanges, UserProfile};
use super::repository::UserRepository;
use crate::error::ErrorKind;
use crate::identity::Actor;
use crate::store::RepositoryError;

/// Profile reads and self-service edits for the calling user.
pub struct AccountService<R> {
    repository: Arc<R>,
}

impl<R> AccountService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn me(&self, actor: Option<&Actor>) -> Result<UserProfile, AccountError> {
        let actor = actor.ok_or(AccountError::Unauthenticated)?;
        self.repository
            .find_by_id(actor.id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    pub async fn update_me(
        &self,
        actor: Option<&Actor>,
        changes: ProfileChanges,
    ) -> Result<UserProfile, AccountError> {
        let actor = actor.ok_or(AccountError::Unauthenticated)?;
        let updated = self
            .repository
            .update_profile(actor.id, &changes)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        info!(
            user_id = %updated.id,
            full_name = changes.full_name.is_some(),
            locale = changes.locale.is_some(),
            "profile updated"
        );
        Ok(updated)
    }

    /// Delete the caller's account along with their host applications.
    pub async fn delete_me(&self, actor: Option<&Actor>) -> Result<(), AccountError> {
        let actor = actor.ok_or(AccountError::Unauthenticated)?;
        let deleted = match self.repository.delete(actor.id).await {
            Ok(deleted) => deleted,
            Err(RepositoryError::ReferenceViolation) => return Err(AccountError::AccountInUse),
            Err(err) => return Err(err.into()),
        };
        if !deleted {
            return Err(AccountError::UserNotFound);
        }

        info!(user_id = %actor.id, "account deleted");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("user not found")]
    UserNotFound,
    #[error("account is recorded as the reviewer of host applications")]
    AccountInUse,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Unauthenticated => ErrorKind::Unauthenticated,
            AccountError::UserNotFound
            | AccountError::Repository(
                RepositoryError::NotFound | RepositoryError::ReferenceViolation,
            ) => ErrorKind::NotFound,
            AccountError::AccountInUse | AccountError::Repository(RepositoryError::Conflict) => {
                ErrorKind::Conflict
            }
            AccountError::Repository(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Role, UserId};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn me_requires_identity_and_existing_row() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(Arc::clone(&store));

        assert!(matches!(
            service.me(None).await,
            Err(AccountError::Unauthenticated)
        ));

        let ghost = Actor::new(UserId(99), Role::User);
        let err = service.me(Some(&ghost)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn update_me_changes_only_supplied_fields() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("guest@yourplace.dev", Role::User).await;
        let service = AccountService::new(Arc::clone(&store));
        let actor = Actor::new(user.id, user.role);

        let updated = service
            .update_me(
                Some(&actor),
                ProfileChanges {
                    full_name: Some("Guest Person".to_string()),
                    locale: None,
                },
            )
            .await
            .expect("profile updates");

        assert_eq!(updated.full_name.as_deref(), Some("Guest Person"));
        assert_eq!(updated.locale, "en");
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.email, "guest@yourplace.dev");
    }

    #[tokio::test]
    async fn delete_me_removes_account_and_applications() {
        use crate::workflows::host_applications::{
            HostApplicationRepository, NewHostApplication, OfferingType,
        };

        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("leaving@yourplace.dev", Role::User).await;
        let service = AccountService::new(Arc::clone(&store));
        let actor = Actor::new(user.id, user.role);
        store
            .create(
                user.id,
                &NewHostApplication {
                    offering_type: OfferingType::Event,
                    space_types: Vec::new(),
                    categories: vec!["music".to_string()],
                    capacity: 20,
                    notes: String::new(),
                },
            )
            .await
            .expect("application stored");

        service.delete_me(Some(&actor)).await.expect("deleted");

        assert_eq!(store.role_of(user.id).await, None);
        assert_eq!(store.application_count().await, 0);
        let again = service.delete_me(Some(&actor)).await.unwrap_err();
        assert!(matches!(again, AccountError::UserNotFound));
        assert_eq!(again.kind(), ErrorKind::NotFound);
        assert!(matches!(
            service.delete_me(None).await,
            Err(AccountError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn delete_me_refuses_reviewer_of_record() {
        use crate::workflows::host_applications::{
            HostApplicationService, NewHostApplication, OfferingType, ReviewCommand,
            ReviewDecision,
        };

        let store = Arc::new(MemoryStore::new());
        let applicant = store.insert_user("applicant@yourplace.dev", Role::User).await;
        let admin = store.insert_user("admin@yourplace.dev", Role::Admin).await;
        let lifecycle = HostApplicationService::new(Arc::clone(&store));
        let applicant = Actor::new(applicant.id, applicant.role);
        let admin = Actor::new(admin.id, admin.role);
        let pending = lifecycle
            .submit(
                Some(&applicant),
                NewHostApplication {
                    offering_type: OfferingType::Space,
                    space_types: vec!["loft".to_string()],
                    categories: vec!["art".to_string()],
                    capacity: 15,
                    notes: String::new(),
                },
            )
            .await
            .expect("submitted");
        lifecycle
            .review(
                Some(&admin),
                pending.id,
                ReviewCommand {
                    decision: ReviewDecision::Rejected,
                    review_notes: String::new(),
                },
            )
            .await
            .expect("reviewed");

        let err = AccountService::new(Arc::clone(&store))
            .delete_me(Some(&admin))
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::AccountInUse));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(store.role_of(admin.id).await, Some(Role::Admin));
    }
}
