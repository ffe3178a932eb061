use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    credential::{Credential, HashedPassword},
    email::Email,
    recovery::RecoveryRequest,
    saga::SagaRecord,
    user_id::UserId,
    username::Username,
    verification_code::VerificationCode,
};

// CredentialStore port trait and errors
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Credential not found")]
    NotFound,
    #[error("Credential is not pending verification")]
    NotPending,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for CredentialStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UsernameTaken, Self::UsernameTaken)
                | (Self::EmailTaken, Self::EmailTaken)
                | (Self::NotFound, Self::NotFound)
                | (Self::NotPending, Self::NotPending)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

/// Owner of the canonical credential records.
///
/// Implementations must enforce uniqueness of both username and email at the
/// storage level: `add_credential` is the authoritative duplicate check.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn add_credential(&self, credential: Credential) -> Result<(), CredentialStoreError>;
    async fn username_exists(&self, username: &Username) -> Result<bool, CredentialStoreError>;
    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError>;
    async fn get_by_username(&self, username: &Username)
    -> Result<Credential, CredentialStoreError>;
    async fn get_by_email(&self, email: &Email) -> Result<Credential, CredentialStoreError>;
    /// Flips a pending credential to verified. Fails with `NotPending` if it
    /// was already verified, so the transition happens at most once.
    async fn mark_verified(&self, username: &Username) -> Result<(), CredentialStoreError>;
    async fn set_password_hash(
        &self,
        username: &Username,
        password_hash: HashedPassword,
    ) -> Result<(), CredentialStoreError>;
    /// Removes the credential created by the saga `user_id`. Only used for
    /// compensation; removing a missing credential succeeds.
    async fn delete_credential(&self, user_id: &UserId) -> Result<(), CredentialStoreError>;
}

// RecoveryRequestStore port trait and errors
#[derive(Debug, Error)]
pub enum RecoveryStoreError {
    #[error("Recovery request not found")]
    NotFound,
    #[error("Recovery code does not match")]
    CodeMismatch,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

#[async_trait]
pub trait RecoveryRequestStore: Send + Sync {
    /// Stores `request`, replacing any earlier request for the same email.
    async fn store_request(&self, request: RecoveryRequest) -> Result<(), RecoveryStoreError>;
    async fn get_request(&self, email: &Email) -> Result<RecoveryRequest, RecoveryStoreError>;
    /// Atomically removes and returns the request for `email` if its code is
    /// `code`. A request with another code stays and yields `CodeMismatch`.
    async fn take_request(
        &self,
        email: &Email,
        code: &VerificationCode,
    ) -> Result<RecoveryRequest, RecoveryStoreError>;
}

// SagaJournal port trait and errors
#[derive(Debug, Error)]
pub enum SagaJournalError {
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

/// Durable log of registration saga transitions.
#[async_trait]
pub trait SagaJournal: Send + Sync {
    /// Upserts the latest state of the saga identified by `record.saga_id`.
    async fn record(&self, record: &SagaRecord) -> Result<(), SagaJournalError>;
    /// Sagas whose last recorded state is not terminal and was written at or
    /// before `cutoff`, oldest first.
    async fn incomplete(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SagaRecord>, SagaJournalError>;
}
