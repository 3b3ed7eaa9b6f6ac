use tracing::info;

use super::domain::{SeedUser, UserProfile, DEFAULT_LOCALE};
use super::repository::UserRepository;
use crate::config::AppEnvironment;
use crate::identity::Role;
use crate::store::RepositoryError;

pub const DEV_ADMIN_EMAIL: &str = "admin@yourplace.dev";
pub const DEV_HOST_EMAIL: &str = "host@yourplace.dev";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("refusing to seed development users in production")]
    Production,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub fn dev_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            email: DEV_ADMIN_EMAIL.to_string(),
            full_name: "Dev Admin".to_string(),
            role: Role::Admin,
            locale: DEFAULT_LOCALE.to_string(),
        },
        SeedUser {
            email: DEV_HOST_EMAIL.to_string(),
            full_name: "Dev Host".to_string(),
            role: Role::Host,
            locale: DEFAULT_LOCALE.to_string(),
        },
    ]
}

/// Upsert the development accounts. Existing rows keep their profile but have
/// their role reset.
pub async fn seed_dev_users<R>(
    repository: &R,
    environment: AppEnvironment,
) -> Result<Vec<UserProfile>, SeedError>
where
    R: UserRepository + ?Sized,
{
    if environment == AppEnvironment::Production {
        return Err(SeedError::Production);
    }

    let mut seeded = Vec::new();
    for user in dev_users() {
        let profile = repository.upsert_with_role(&user).await?;
        info!(user_id = %profile.id, email = %profile.email, role = %profile.role, "seeded user");
        seeded.push(profile);
    }
    Ok(seeded)
}
