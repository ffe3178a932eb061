pub mod auth;
pub mod collaborators;
pub mod config;
pub mod email;
pub mod persistence;

pub use auth::{Argon2PasswordHasher, JwtKeys, JwtTokenIssuer};
pub use collaborators::{CollaboratorEndpoint, HttpGraphClient, HttpProfileClient};
pub use config::{AllowedOrigins, RoostSettings};
pub use email::{MockEmailClient, PostmarkEmailClient};
pub use persistence::{
    DashMapSagaJournal, HashMapCredentialStore, HashMapRecoveryStore, PostgresCredentialStore,
    PostgresSagaJournal, RedisRecoveryStore,
};
