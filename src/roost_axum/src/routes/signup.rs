use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use roost_application::RegisteredAccount;
use roost_core::{
    AccountDetails, BusinessProfile, Email, Password, Registration, RegularProfile, Username,
};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{error::ApiError, state::SignupState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularSignupRequest {
    pub username: String,
    pub email: Secret<String>,
    pub password: Secret<String>,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: String,
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct BusinessSignupRequest {
    pub username: String,
    pub email: Secret<String>,
    pub password: Secret<String>,
    pub company: String,
    pub website: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: String,
    pub username: String,
}

impl From<RegisteredAccount> for SignupResponse {
    fn from(account: RegisteredAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            username: account.username.as_str().to_owned(),
        }
    }
}

#[tracing::instrument(name = "Signup regular", skip_all, fields(username = %request.username))]
pub async fn signup_regular(
    State(state): State<SignupState>,
    Json(request): Json<RegularSignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = Username::parse(&request.username)?;
    let email = Email::parse(request.email)?;
    let password = Password::parse(request.password)?;
    let profile = RegularProfile::parse(
        &request.first_name,
        &request.last_name,
        &request.gender,
        &request.age,
        &request.city,
    )?;

    let registration = Registration::new(
        username,
        email,
        password,
        AccountDetails::Regular(profile),
    );
    register(&state, registration).await
}

#[tracing::instrument(name = "Signup business", skip_all, fields(username = %request.username))]
pub async fn signup_business(
    State(state): State<SignupState>,
    Json(request): Json<BusinessSignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = Username::parse(&request.username)?;
    let email = Email::parse(request.email)?;
    let password = Password::parse(request.password)?;
    let profile = BusinessProfile::parse(&request.company, &request.website)?;

    let registration = Registration::new(
        username,
        email,
        password,
        AccountDetails::Business(profile),
    );
    register(&state, registration).await
}

async fn register(
    state: &SignupState,
    registration: Registration,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let deadline = Instant::now() + state.deadline;
    let account = state.saga.execute(registration, Some(deadline)).await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}
