use std::sync::Arc;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

const TOKEN_HEADER: &str = "Token";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: Arc<str>,
}

impl SessionConfig {
    pub fn new(cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

/// Finds the session token in `Authorization: Bearer`, then the `Token`
/// header, then the session cookie.
pub fn extract_token<'a>(
    headers: &'a HeaderMap,
    jar: &'a CookieJar,
    cookie_name: &str,
) -> Option<&'a str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let header = || {
        headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
    };

    bearer
        .or_else(header)
        .or_else(|| jar.get(cookie_name).map(|cookie| cookie.value()))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn create_auth_cookie(token: String, cookie_name: &str) -> Cookie<'static> {
    Cookie::build((cookie_name.to_owned(), token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}
