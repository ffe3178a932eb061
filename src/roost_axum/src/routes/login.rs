use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use roost_core::Username;
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, session::create_auth_cookie, state::LoginState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: Secret<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Returns the session token in the body and as the auth cookie.
#[tracing::instrument(name = "Login", skip_all, fields(username = %request.username))]
pub async fn login(
    State(state): State<LoginState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // A name that fails validation cannot belong to any account.
    let username = Username::parse(&request.username).map_err(|_| ApiError::WrongCredentials)?;

    let token = state
        .login
        .execute(username, request.password)
        .await?
        .into_string();

    let cookie = create_auth_cookie(token.clone(), &state.session.cookie_name);

    Ok((jar.add(cookie), Json(LoginResponse { token })))
}
