use std::fmt;

use rand::Rng;

use super::validation::ValidationError;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Six-digit one-time code used for email verification and password recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Draws a fresh code uniformly from `100000..=999999`.
    pub fn generate() -> Self {
        let code = rand::rng().random_range(CODE_MIN..=CODE_MAX);
        Self(code.to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.len() != 6 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCode);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
