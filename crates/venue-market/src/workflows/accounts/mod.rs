//! Account profiles: the caller's own user row and the development seed.

pub mod domain;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;

pub use domain::{
    ProfileChanges, ProfileUpdateRequest, ProfileValidationError, SeedUser, UserProfile,
    DEFAULT_LOCALE, FULL_NAME_MAX_CHARS, LOCALE_MAX_CHARS, LOCALE_MIN_CHARS,
};
pub use repository::UserRepository;
pub use router::account_router;
pub use seed::{dev_users, seed_dev_users, SeedError, DEV_ADMIN_EMAIL, DEV_HOST_EMAIL};
pub use service::{AccountError, AccountService};
