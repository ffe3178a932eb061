use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use roost_application::{
    ChangePasswordError, CodeDeliveryError, LoginError, RecoveryError, RegistrationError,
    VerifyCodeError,
};
use roost_core::{CollaboratorError, TokenError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("{collaborator} is temporarily unavailable")]
    ServiceUnavailable {
        collaborator: String,
        retry_after: Duration,
    },

    #[error("Upstream service failed: {0}")]
    Upstream(String),

    #[error("Registration failed and could not be fully rolled back")]
    InconsistentState,

    #[error("Wrong credentials")]
    WrongCredentials,

    #[error("Account is not verified")]
    NotVerified,

    #[error("Invalid or expired code")]
    InvalidCode,

    #[error("Account is already verified")]
    AlreadyVerified,

    #[error("User doesn't exist")]
    UnknownAccount,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Not allowed to act on this account")]
    Forbidden,

    #[error("Request did not complete in time")]
    DeadlineExceeded,

    #[error("Unexpected error")]
    Unexpected(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UsernameTaken | ApiError::EmailTaken | ApiError::AlreadyVerified => {
                StatusCode::CONFLICT
            }
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::WrongCredentials
            | ApiError::NotVerified
            | ApiError::InvalidCode
            | ApiError::MissingToken
            | ApiError::InvalidToken
            | ApiError::ExpiredToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UnknownAccount => StatusCode::NOT_FOUND,
            ApiError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InconsistentState | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if let ApiError::Unexpected(ref details) = self {
            tracing::error!(error = %details, "Request failed unexpectedly");
        }

        let retry_after = match &self {
            ApiError::ServiceUnavailable { retry_after, .. } => {
                let seconds = (retry_after.as_secs_f64().ceil() as u64).max(1);
                HeaderValue::from_str(&seconds.to_string()).ok()
            }
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        let mut response = (status_code, body).into_response();
        if let Some(retry_after) = retry_after {
            response.headers_mut().insert(RETRY_AFTER, retry_after);
        }
        response
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(error: CollaboratorError) -> Self {
        match error {
            CollaboratorError::BreakerOpen {
                collaborator,
                retry_after,
            } => ApiError::ServiceUnavailable {
                collaborator,
                retry_after,
            },
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<CodeDeliveryError> for ApiError {
    fn from(error: CodeDeliveryError) -> Self {
        ApiError::Upstream(error.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Invalid => ApiError::InvalidToken,
            TokenError::Expired => ApiError::ExpiredToken,
            TokenError::UnexpectedError(e) => ApiError::Unexpected(e),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::UsernameTaken => ApiError::UsernameTaken,
            RegistrationError::EmailTaken => ApiError::EmailTaken,
            RegistrationError::CodeDelivery(e) => e.into(),
            RegistrationError::Collaborator(e) => e.into(),
            RegistrationError::DeadlineExceeded => ApiError::DeadlineExceeded,
            RegistrationError::InconsistentState { .. } => ApiError::InconsistentState,
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

impl From<VerifyCodeError> for ApiError {
    fn from(error: VerifyCodeError) -> Self {
        match error {
            VerifyCodeError::UnknownAccount => ApiError::UnknownAccount,
            VerifyCodeError::AlreadyVerified => ApiError::AlreadyVerified,
            VerifyCodeError::InvalidCode => ApiError::InvalidCode,
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(error: LoginError) -> Self {
        match error {
            LoginError::WrongCredentials => ApiError::WrongCredentials,
            LoginError::NotVerified => ApiError::NotVerified,
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

impl From<ChangePasswordError> for ApiError {
    fn from(error: ChangePasswordError) -> Self {
        match error {
            ChangePasswordError::Forbidden => ApiError::Forbidden,
            ChangePasswordError::WrongPassword => ApiError::WrongCredentials,
            ChangePasswordError::UnknownAccount => ApiError::UnknownAccount,
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

impl From<RecoveryError> for ApiError {
    fn from(error: RecoveryError) -> Self {
        match error {
            RecoveryError::UnknownAccount => ApiError::UnknownAccount,
            RecoveryError::InvalidCode => ApiError::InvalidCode,
            RecoveryError::CodeDelivery(e) => e.into(),
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}
