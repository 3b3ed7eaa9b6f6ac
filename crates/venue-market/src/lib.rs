//! Venue marketplace backend: host onboarding workflow, account profiles,
//! and the stores and routers serving them.

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod store;
pub mod telemetry;
pub mod workflows;
