use async_trait::async_trait;

use super::domain::{ProfileChanges, SeedUser, UserProfile};
use crate::identity::UserId;
use crate::store::RepositoryError;

/// Storage abstraction over the `users` table.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError>;

    /// Apply the set fields of `changes`; `None` when the user does not exist.
    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<Option<UserProfile>, RepositoryError>;

    /// Insert the account, or reset the role of the account already holding
    /// `seed.email`.
    async fn upsert_with_role(&self, seed: &SeedUser) -> Result<UserProfile, RepositoryError>;

    /// Remove the user and their applications. `false` when no row matched;
    /// `ReferenceViolation` while reviewed applications still name the user.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
}
