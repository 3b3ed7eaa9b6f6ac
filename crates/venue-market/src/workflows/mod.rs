pub mod accounts;
pub mod host_applications;
