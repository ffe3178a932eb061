use arc_swap::ArcSwap;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use roost_core::{Role, SessionClaims, SessionToken, TokenError, TokenIssuer, Username};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Signing secret plus the retired secrets whose tokens are still accepted.
#[derive(Clone)]
pub struct JwtKeys {
    pub current: Secret<String>,
    pub previous: Vec<Secret<String>>,
}

/// HS256 session tokens with runtime key rotation.
pub struct JwtTokenIssuer {
    keys: ArcSwap<JwtKeys>,
    token_ttl_in_seconds: i64,
}

impl JwtTokenIssuer {
    pub fn new(keys: JwtKeys, token_ttl_in_seconds: i64) -> Self {
        Self {
            keys: ArcSwap::from_pointee(keys),
            token_ttl_in_seconds,
        }
    }

    /// Makes `secret` the signing key. The old key keeps validating, along
    /// with at most `retain` earlier keys.
    pub fn rotate(&self, secret: Secret<String>, retain: usize) {
        self.keys.rcu(|keys| {
            let mut previous = Vec::with_capacity(retain);
            previous.push(keys.current.clone());
            previous.extend(keys.previous.iter().cloned());
            previous.truncate(retain);
            JwtKeys {
                current: secret.clone(),
                previous,
            }
        });
        tracing::info!(retained = retain, "JWT signing key rotated");
    }

    pub fn token_ttl_in_seconds(&self) -> i64 {
        self.token_ttl_in_seconds
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, username: &Username, role: Role) -> Result<SessionToken, TokenError> {
        let delta = chrono::Duration::try_seconds(self.token_ttl_in_seconds).ok_or(
            TokenError::UnexpectedError("Failed to create auth token duration".to_string()),
        )?;

        let now = Utc::now();
        let exp = now
            .checked_add_signed(delta)
            .ok_or(TokenError::UnexpectedError(
                "Duration out of range".to_string(),
            ))?
            .timestamp();

        let claims = Claims {
            sub: username.as_str().to_string(),
            role,
            iat: now.timestamp(),
            exp,
        };

        let keys = self.keys.load();
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(keys.current.expose_secret().as_bytes()),
        )
        .map(SessionToken::new)
        .map_err(|e| TokenError::UnexpectedError(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let keys = self.keys.load();
        let validation = Validation::new(Algorithm::HS256);

        for secret in std::iter::once(&keys.current).chain(keys.previous.iter()) {
            let decoded = decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
                &validation,
            );

            match decoded {
                Ok(data) => {
                    return Ok(SessionClaims {
                        username: data.claims.sub,
                        role: data.claims.role,
                        expires_at: data.claims.exp,
                    });
                }
                Err(e) if *e.kind() == ErrorKind::InvalidSignature => continue,
                Err(e) if *e.kind() == ErrorKind::ExpiredSignature => {
                    return Err(TokenError::Expired);
                }
                Err(_) => return Err(TokenError::Invalid),
            }
        }

        Err(TokenError::Invalid)
    }
}
