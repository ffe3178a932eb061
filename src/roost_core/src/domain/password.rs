use std::{collections::HashSet, sync::LazyLock};

use rand::{Rng, distr::Alphanumeric};
use secrecy::{ExposeSecret, Secret};

use super::validation::{ValidationError, required};

const MIN_PASSWORD_LENGTH: usize = 8;
const SALT_LENGTH: usize = 16;

static BLACKLIST: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    include_str!("password_blacklist.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
});

/// A new password that satisfies the strength policy.
///
/// Only passwords being *set* go through this type. Login attempts and
/// current-password checks compare the raw candidate against the stored hash.
#[derive(Debug, Clone)]
pub struct Password(Secret<String>);

impl Password {
    pub fn parse(raw: Secret<String>) -> Result<Self, ValidationError> {
        let candidate = raw.expose_secret();
        required("password", candidate)?;

        if BLACKLIST.contains(candidate.as_str()) {
            return Err(ValidationError::BlacklistedPassword);
        }

        let long_enough = candidate.chars().count() >= MIN_PASSWORD_LENGTH;
        let has_upper = candidate.chars().any(char::is_uppercase);
        let has_lower = candidate.chars().any(char::is_lowercase);
        let has_digit = candidate.chars().any(|c| c.is_ascii_digit());

        if !(long_enough && has_upper && has_lower && has_digit) {
            return Err(ValidationError::WeakPassword);
        }

        Ok(Self(raw))
    }
}

impl TryFrom<Secret<String>> for Password {
    type Error = ValidationError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

/// Per-credential salt appended to the password before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(String);

impl Salt {
    pub fn generate() -> Self {
        let salt = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect();
        Self(salt)
    }

    /// Rehydrates a salt read back from storage.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Concatenates `password` and this salt, the input fed to the hasher.
    pub fn season(&self, password: &Secret<String>) -> Secret<String> {
        Secret::new(format!("{}{}", password.expose_secret(), self.0))
    }
}
