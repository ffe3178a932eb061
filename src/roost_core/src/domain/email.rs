use std::{
    hash::{Hash, Hasher},
    sync::LazyLock,
};

use regex::Regex;
use secrecy::{ExposeSecret, Secret};

use super::validation::{ValidationError, required};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").expect("email pattern is valid")
});

/// A normalized (trimmed, lower-cased) email address.
///
/// The address is kept behind [`Secret`] so it never ends up in `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Email(Secret<String>);

impl Email {
    pub fn parse(raw: Secret<String>) -> Result<Self, ValidationError> {
        let normalized = required("email", raw.expose_secret())?.to_lowercase();
        if !EMAIL_REGEX.is_match(&normalized) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(Self(Secret::new(normalized)))
    }
}

impl TryFrom<Secret<String>> for Email {
    type Error = ValidationError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<Secret<String>> for Email {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for Email {}

impl Hash for Email {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.expose_secret().hash(state);
    }
}
