use std::sync::Arc;

use roost_core::{
    CredentialStore, CredentialStoreError, Password, PasswordHashError, PasswordHasher,
    SessionClaims, Username,
};
use secrecy::Secret;

/// Error types for change password use case
#[derive(Debug, thiserror::Error)]
pub enum ChangePasswordError {
    #[error("Token does not belong to this user")]
    Forbidden,
    #[error("Current password is wrong")]
    WrongPassword,
    #[error("User doesn't exist")]
    UnknownAccount,
    #[error("Password hashing failed: {0}")]
    Hashing(PasswordHashError),
    #[error("Credential store error: {0}")]
    CredentialStoreError(CredentialStoreError),
}

impl From<CredentialStoreError> for ChangePasswordError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::NotFound => Self::UnknownAccount,
            other => Self::CredentialStoreError(other),
        }
    }
}

impl From<PasswordHashError> for ChangePasswordError {
    fn from(error: PasswordHashError) -> Self {
        match error {
            PasswordHashError::Mismatch => Self::WrongPassword,
            other => Self::Hashing(other),
        }
    }
}

/// Change password use case - replaces the password of the authenticated user
pub struct ChangePasswordUseCase<C: ?Sized, H: ?Sized> {
    credentials: Arc<C>,
    hasher: Arc<H>,
}

impl<C, H> ChangePasswordUseCase<C, H>
where
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    pub fn new(credentials: Arc<C>, hasher: Arc<H>) -> Self {
        Self {
            credentials,
            hasher,
        }
    }

    /// # Arguments
    /// * `claims` - Claims of the caller's session token
    /// * `username` - Account whose password is changed; must be the token subject
    /// * `current_password` - Checked against the stored hash
    /// * `new_password` - Already validated against the password policy
    #[tracing::instrument(
        name = "ChangePasswordUseCase::execute",
        skip(self, claims, current_password, new_password)
    )]
    pub async fn execute(
        &self,
        claims: &SessionClaims,
        username: Username,
        current_password: Secret<String>,
        new_password: Password,
    ) -> Result<(), ChangePasswordError> {
        if claims.username != username.as_str() {
            return Err(ChangePasswordError::Forbidden);
        }

        let credential = self.credentials.get_by_username(&username).await?;
        self.hasher
            .verify(
                &current_password,
                credential.salt(),
                credential.password_hash(),
            )
            .await?;

        let password_hash = self.hasher.hash(&new_password, credential.salt()).await?;
        self.credentials
            .set_password_hash(&username, password_hash)
            .await?;

        tracing::info!("password changed");
        Ok(())
    }
}
