pub mod auth_service;
pub mod helpers;
pub mod shutdown;
pub mod telemetry;

pub use auth_service::{AuthDependencies, AuthService, AuthServiceOptions};
