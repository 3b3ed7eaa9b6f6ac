use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Role, UserId};

pub const FULL_NAME_MAX_CHARS: usize = 160;
pub const LOCALE_MIN_CHARS: usize = 2;
pub const LOCALE_MAX_CHARS: usize = 10;
pub const DEFAULT_LOCALE: &str = "en";

/// Public view of a `users` row. Credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub locale: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire payload for `PATCH /users/me`. Email, role, and password are not
/// editable through this route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Validated profile changes; at least one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileValidationError {
    #[error("at least one field must be provided")]
    NoChanges,
    #[error("fullName must be between 1 and {max} characters (found {found})")]
    FullNameLength { max: usize, found: usize },
    #[error("locale must be between {min} and {max} characters (found {found})")]
    LocaleLength { min: usize, max: usize, found: usize },
}

impl TryFrom<ProfileUpdateRequest> for ProfileChanges {
    type Error = ProfileValidationError;

    fn try_from(request: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        let ProfileUpdateRequest { full_name, locale } = request;
        if full_name.is_none() && locale.is_none() {
            return Err(ProfileValidationError::NoChanges);
        }

        if let Some(name) = &full_name {
            let found = name.chars().count();
            if found == 0 || found > FULL_NAME_MAX_CHARS {
                return Err(ProfileValidationError::FullNameLength {
                    max: FULL_NAME_MAX_CHARS,
                    found,
                });
            }
        }

        if let Some(locale) = &locale {
            let found = locale.chars().count();
            if !(LOCALE_MIN_CHARS..=LOCALE_MAX_CHARS).contains(&found) {
                return Err(ProfileValidationError::LocaleLength {
                    min: LOCALE_MIN_CHARS,
                    max: LOCALE_MAX_CHARS,
                    found,
                });
            }
        }

        Ok(Self { full_name, locale })
    }
}

/// Account to create, or whose role to reset, when seeding an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub locale: String,
}
