use std::time::Duration;

use async_trait::async_trait;
use secrecy::Secret;
use thiserror::Error;

use crate::domain::{
    credential::HashedPassword,
    email::Email,
    password::{Password, Salt},
    registration::AccountDetails,
    role::Role,
    user_id::UserId,
    username::Username,
};

// ============================================================================
// Email delivery
// ============================================================================

#[derive(Debug, Error)]
#[error("Failed to send email: {0}")]
pub struct EmailError(pub String);

/// Port trait for email sending service
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(
        &self,
        recipient: &Email,
        subject: &str,
        content: &str,
    ) -> Result<(), EmailError>;
}

// ============================================================================
// Password hashing
// ============================================================================

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password does not match")]
    Mismatch,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

/// Salted, deliberately slow password hashing.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(
        &self,
        password: &Password,
        salt: &Salt,
    ) -> Result<HashedPassword, PasswordHashError>;

    /// Succeeds only if `candidate` seasoned with `salt` hashes to `expected`.
    async fn verify(
        &self,
        candidate: &Secret<String>,
        salt: &Salt,
        expected: &HashedPassword,
    ) -> Result<(), PasswordHashError>;
}

// ============================================================================
// Session tokens
// ============================================================================

/// A signed session token handed to the client after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Claims carried by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    pub role: Role,
    pub expires_at: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, username: &Username, role: Role) -> Result<SessionToken, TokenError>;
    fn validate(&self, token: &str) -> Result<SessionClaims, TokenError>;
}

// ============================================================================
// Collaborators (profile service, social graph service)
// ============================================================================

/// Failure of a call to a collaborator service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{collaborator} circuit breaker is open, retry after {retry_after:?}")]
    BreakerOpen {
        collaborator: String,
        retry_after: Duration,
    },
    #[error("{collaborator} responded with status {status}")]
    Status { collaborator: String, status: u16 },
    #[error("{collaborator} request failed: {message}")]
    Transport {
        collaborator: String,
        message: String,
    },
    #[error("{collaborator} did not respond within {timeout:?}")]
    Timeout {
        collaborator: String,
        timeout: Duration,
    },
}

impl CollaboratorError {
    /// Whether the remote side may have applied the request despite the failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Payload sent to the profile service.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub details: AccountDetails,
}

impl ProfileRecord {
    pub fn role(&self) -> Role {
        self.details.role()
    }
}

/// Payload sent to the social graph service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: UserId,
    pub role: Role,
    pub name: String,
    pub username: Username,
}

/// Creation goes through the collaborator's circuit breaker; deletion is
/// compensation and is sent regardless of breaker state.
#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn create_profile(&self, profile: &ProfileRecord) -> Result<(), CollaboratorError>;
    async fn delete_profile(&self, id: &UserId) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn create_node(&self, node: &GraphNode) -> Result<(), CollaboratorError>;
    async fn delete_node(&self, id: &UserId) -> Result<(), CollaboratorError>;
}
