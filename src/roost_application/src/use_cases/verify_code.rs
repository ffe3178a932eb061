use std::sync::Arc;

use roost_core::{CredentialStore, CredentialStoreError, Username, VerificationCode};

#[derive(Debug, thiserror::Error)]
pub enum VerifyCodeError {
    #[error("User doesn't exist")]
    UnknownAccount,
    #[error("Account is already verified")]
    AlreadyVerified,
    #[error("Invalid verification code")]
    InvalidCode,
    #[error("Credential store error: {0}")]
    CredentialStoreError(CredentialStoreError),
}

impl From<CredentialStoreError> for VerifyCodeError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::NotFound => Self::UnknownAccount,
            CredentialStoreError::NotPending => Self::AlreadyVerified,
            other => Self::CredentialStoreError(other),
        }
    }
}

/// Verify code use case - activates a pending account
pub struct VerifyCodeUseCase<C: ?Sized> {
    credentials: Arc<C>,
}

impl<C> VerifyCodeUseCase<C>
where
    C: CredentialStore + ?Sized,
{
    pub fn new(credentials: Arc<C>) -> Self {
        Self { credentials }
    }

    /// Flips the account to verified if `code` matches the one issued at
    /// registration. Succeeds at most once per account.
    #[tracing::instrument(name = "VerifyCodeUseCase::execute", skip(self, code))]
    pub async fn execute(
        &self,
        username: Username,
        code: VerificationCode,
    ) -> Result<(), VerifyCodeError> {
        let credential = self.credentials.get_by_username(&username).await?;

        if !credential.is_pending() {
            return Err(VerifyCodeError::AlreadyVerified);
        }
        if credential.verification_code() != &code {
            return Err(VerifyCodeError::InvalidCode);
        }

        // The store only flips pending credentials, so a concurrent
        // verification of the same account fails here with AlreadyVerified.
        self.credentials.mark_verified(&username).await?;

        tracing::info!("account verified");
        Ok(())
    }
}
