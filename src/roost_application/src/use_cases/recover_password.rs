//! Password recovery by emailed one-time code.
//!
//! A recovery code is bound to the email it was sent to, expires after a
//! configurable time and can be redeemed once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use roost_core::{
    CredentialStore, CredentialStoreError, Email, EmailClient, Password, PasswordHashError,
    PasswordHasher, RecoveryRequest, RecoveryRequestStore, RecoveryStoreError, VerificationCode,
};

use super::code_issuer::{CodeDeliveryError, VerificationCodeIssuer};

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("User doesn't exist")]
    UnknownAccount,
    #[error("Invalid or expired recovery code")]
    InvalidCode,
    #[error("Failed to deliver recovery code: {0}")]
    CodeDelivery(#[from] CodeDeliveryError),
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] PasswordHashError),
    #[error("Recovery store error: {0}")]
    RecoveryStoreError(RecoveryStoreError),
    #[error("Credential store error: {0}")]
    CredentialStoreError(CredentialStoreError),
}

impl From<CredentialStoreError> for RecoveryError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::NotFound => Self::UnknownAccount,
            other => Self::CredentialStoreError(other),
        }
    }
}

impl From<RecoveryStoreError> for RecoveryError {
    fn from(error: RecoveryStoreError) -> Self {
        match error {
            RecoveryStoreError::NotFound | RecoveryStoreError::CodeMismatch => Self::InvalidCode,
            other => Self::RecoveryStoreError(other),
        }
    }
}

/// Sends a recovery code to the email of an existing account.
pub struct RequestRecoveryCodeUseCase<C: ?Sized, R: ?Sized, E: ?Sized> {
    credentials: Arc<C>,
    requests: Arc<R>,
    codes: VerificationCodeIssuer<E>,
}

impl<C, R, E> RequestRecoveryCodeUseCase<C, R, E>
where
    C: CredentialStore + ?Sized,
    R: RecoveryRequestStore + ?Sized,
    E: EmailClient + ?Sized,
{
    pub fn new(credentials: Arc<C>, requests: Arc<R>, email_client: Arc<E>) -> Self {
        Self {
            credentials,
            requests,
            codes: VerificationCodeIssuer::new(email_client),
        }
    }

    /// Replaces any outstanding code for `email`.
    #[tracing::instrument(name = "RequestRecoveryCodeUseCase::execute", skip_all)]
    pub async fn execute(&self, email: Email) -> Result<(), RecoveryError> {
        self.credentials.get_by_email(&email).await?;

        let code = self.codes.issue();
        self.requests
            .store_request(RecoveryRequest::new(email.clone(), code.clone()))
            .await?;
        self.codes.send_recovery(&email, &code).await?;

        Ok(())
    }
}

/// Redeems a recovery code and sets a new password.
pub struct ResetPasswordUseCase<C: ?Sized, R: ?Sized, H: ?Sized> {
    credentials: Arc<C>,
    requests: Arc<R>,
    hasher: Arc<H>,
    code_ttl: Duration,
}

impl<C, R, H> ResetPasswordUseCase<C, R, H>
where
    C: CredentialStore + ?Sized,
    R: RecoveryRequestStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    pub fn new(credentials: Arc<C>, requests: Arc<R>, hasher: Arc<H>, code_ttl: Duration) -> Self {
        Self {
            credentials,
            requests,
            hasher,
            code_ttl,
        }
    }

    #[tracing::instrument(name = "ResetPasswordUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        email: Email,
        code: VerificationCode,
        new_password: Password,
    ) -> Result<(), RecoveryError> {
        // Of two concurrent resets with the same code only one takes the
        // request; a newer request with another code is left untouched.
        let request = self.requests.take_request(&email, &code).await?;
        if request.is_expired(self.code_ttl, Utc::now()) {
            return Err(RecoveryError::InvalidCode);
        }

        let credential = self.credentials.get_by_email(&email).await?;
        let password_hash = self.hasher.hash(&new_password, credential.salt()).await?;
        self.credentials
            .set_password_hash(credential.username(), password_hash)
            .await?;

        tracing::info!("password reset");
        Ok(())
    }
}
