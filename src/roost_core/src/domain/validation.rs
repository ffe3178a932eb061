use thiserror::Error;

/// Rejections produced while parsing user input into domain types.
///
/// Messages are user-facing and are returned verbatim by the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required, missing: {0}")]
    MissingField(&'static str),
    #[error("Username must be 3 to 30 letters, digits, '.', '_' or '-'")]
    InvalidUsername,
    #[error("Email must be like example@gmail.com")]
    InvalidEmail,
    #[error(
        "Minimum eight characters, at least one uppercase letter, one lowercase letter and one number"
    )]
    WeakPassword,
    #[error("Use stronger password")]
    BlacklistedPassword,
    #[error("{0} can contain only letters")]
    LettersOnly(&'static str),
    #[error("Gender can only be male or female")]
    InvalidGender,
    #[error("Age can only contain digits")]
    InvalidAge,
    #[error("Code must be exactly 6 digits")]
    InvalidCode,
}

/// Trims `value` and fails with [`ValidationError::MissingField`] when nothing is left.
pub(crate) fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

pub(crate) fn letters_only(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    if !value.chars().all(char::is_alphabetic) {
        return Err(ValidationError::LettersOnly(field));
    }
    Ok(value.to_owned())
}
