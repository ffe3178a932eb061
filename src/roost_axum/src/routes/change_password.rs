//! Password change for a signed-in user.
//!
//! The caller must present a session token whose subject is the account in
//! the path, and must know the current password.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use roost_core::{Password, Username};
use secrecy::Secret;
use serde::Deserialize;

use crate::{error::ApiError, session::extract_token, state::ChangePasswordState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Secret<String>,
    pub new_password: Secret<String>,
}

#[tracing::instrument(name = "Change password", skip(state, headers, jar, request))]
pub async fn change_password(
    State(state): State<ChangePasswordState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_token(&headers, &jar, &state.session.cookie_name)
        .ok_or(ApiError::MissingToken)?;
    let claims = state.tokens.validate(token)?;

    let username = Username::parse(&username)?;
    let new_password = Password::parse(request.new_password)?;

    state
        .change_password
        .execute(&claims, username, request.current_password, new_password)
        .await?;

    Ok(StatusCode::OK)
}
