use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use roost_core::{Username, VerificationCode};
use serde::Deserialize;

use crate::{error::ApiError, state::DynVerifyCode};

#[derive(Debug, Deserialize)]
pub struct ValidateCodeRequest {
    pub username: String,
    pub code: String,
}

#[tracing::instrument(name = "Validate code", skip_all, fields(username = %request.username))]
pub async fn validate_code(
    State(verify_code): State<Arc<DynVerifyCode>>,
    Json(request): Json<ValidateCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = Username::parse(&request.username)?;
    let code = VerificationCode::parse(&request.code)?;

    verify_code.execute(username, code).await?;

    Ok(StatusCode::OK)
}
