use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use roost_core::{Email, Password, VerificationCode};
use secrecy::Secret;
use serde::Deserialize;

use crate::{
    error::ApiError,
    state::{DynRequestRecoveryCode, DynResetPassword},
};

#[derive(Debug, Deserialize)]
pub struct CodeRecoveryRequest {
    pub email: Secret<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryPasswordRequest {
    pub email: Secret<String>,
    pub code: String,
    pub new_password: Secret<String>,
}

/// Emails a one-time recovery code to the account's address.
#[tracing::instrument(name = "Code recovery", skip_all)]
pub async fn code_recovery(
    State(request_code): State<Arc<DynRequestRecoveryCode>>,
    Json(request): Json<CodeRecoveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = Email::parse(request.email)?;

    request_code.execute(email).await?;

    Ok(StatusCode::OK)
}

/// Redeems a recovery code and sets the new password.
#[tracing::instrument(name = "Recovery password", skip_all)]
pub async fn recovery_password(
    State(reset_password): State<Arc<DynResetPassword>>,
    Json(request): Json<RecoveryPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = Email::parse(request.email)?;
    let code = VerificationCode::parse(&request.code)?;
    let new_password = Password::parse(request.new_password)?;

    reset_password.execute(email, code, new_password).await?;

    Ok(StatusCode::OK)
}
