use std::sync::Arc;

use roost_core::{
    CredentialStore, CredentialStoreError, PasswordHashError, PasswordHasher, SessionToken,
    TokenError, TokenIssuer, Username,
};
use secrecy::Secret;

/// Error types for login use case
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// Unknown username or wrong password; the two are never told apart.
    #[error("Wrong credentials")]
    WrongCredentials,
    #[error("Account is not verified")]
    NotVerified,
    #[error("Password hashing failed: {0}")]
    Hashing(PasswordHashError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Credential store error: {0}")]
    CredentialStoreError(CredentialStoreError),
}

impl From<CredentialStoreError> for LoginError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::NotFound => Self::WrongCredentials,
            other => Self::CredentialStoreError(other),
        }
    }
}

impl From<PasswordHashError> for LoginError {
    fn from(error: PasswordHashError) -> Self {
        match error {
            PasswordHashError::Mismatch => Self::WrongCredentials,
            other => Self::Hashing(other),
        }
    }
}

/// Login use case - checks credentials and issues a session token
pub struct LoginUseCase<C: ?Sized, H: ?Sized, T: ?Sized> {
    credentials: Arc<C>,
    hasher: Arc<H>,
    tokens: Arc<T>,
}

impl<C, H, T> LoginUseCase<C, H, T>
where
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
    T: TokenIssuer + ?Sized,
{
    pub fn new(credentials: Arc<C>, hasher: Arc<H>, tokens: Arc<T>) -> Self {
        Self {
            credentials,
            hasher,
            tokens,
        }
    }

    /// Pending accounts fail before the password is looked at.
    #[tracing::instrument(name = "LoginUseCase::execute", skip(self, password))]
    pub async fn execute(
        &self,
        username: Username,
        password: Secret<String>,
    ) -> Result<SessionToken, LoginError> {
        let credential = self.credentials.get_by_username(&username).await?;

        if !credential.is_verified() {
            return Err(LoginError::NotVerified);
        }

        self.hasher
            .verify(&password, credential.salt(), credential.password_hash())
            .await?;

        Ok(self.tokens.issue(credential.username(), credential.role())?)
    }
}
