use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{PasswordHasher as _, SaltString, rand_core},
};
use roost_core::{HashedPassword, Password, PasswordHashError, PasswordHasher, Salt};
use secrecy::{ExposeSecret, Secret};

/// Argon2id over the password seasoned with the credential's own salt.
///
/// Hashing is CPU bound and runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(
        &self,
        password: &Password,
        salt: &Salt,
    ) -> Result<HashedPassword, PasswordHashError> {
        compute_password_hash(salt.season(password.as_ref()))
            .await
            .map(HashedPassword::new)
            .map_err(PasswordHashError::UnexpectedError)
    }

    async fn verify(
        &self,
        candidate: &Secret<String>,
        salt: &Salt,
        expected: &HashedPassword,
    ) -> Result<(), PasswordHashError> {
        verify_password_hash(expected.as_ref().clone(), salt.season(candidate)).await
    }
}

fn argon2() -> Result<Argon2<'static>, String> {
    Ok(Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).map_err(|e| e.to_string())?,
    ))
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
async fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), PasswordHashError> {
    let current_span: tracing::Span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        current_span.in_scope(|| {
            let expected_password_hash: PasswordHash<'_> =
                PasswordHash::new(expected_password_hash.expose_secret())
                    .map_err(|e| PasswordHashError::UnexpectedError(e.to_string()))?;

            argon2()
                .map_err(PasswordHashError::UnexpectedError)?
                .verify_password(
                    password_candidate.expose_secret().as_bytes(),
                    &expected_password_hash,
                )
                .map_err(|e| match e {
                    argon2::password_hash::Error::Password => PasswordHashError::Mismatch,
                    other => PasswordHashError::UnexpectedError(other.to_string()),
                })
        })
    })
    .await
    .map_err(|e| PasswordHashError::UnexpectedError(e.to_string()))?
}

#[tracing::instrument(name = "Computing password hash", skip_all)]
async fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, String> {
    let current_span: tracing::Span = tracing::Span::current();

    let result = tokio::task::spawn_blocking(move || {
        current_span.in_scope(move || {
            let salt: SaltString = SaltString::generate(rand_core::OsRng);
            argon2()?
                .hash_password(password.expose_secret().as_bytes(), &salt)
                .map(|h| Secret::from(h.to_string()))
                .map_err(|e| e.to_string())
        })
    })
    .await
    .map_err(|e| e.to_string())?;

    result
}
