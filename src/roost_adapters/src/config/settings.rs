use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use http::HeaderValue;
use roost_core::CircuitBreakerConfig;
use secrecy::Secret;
use serde::Deserialize;

use super::constants::{DEFAULT_CONFIG_PATH, env, prod};
use crate::auth::JwtKeys;

/// Service configuration.
///
/// Layers, lowest precedence first: serde defaults, the JSON file, then
/// `ROOST__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct RoostSettings {
    #[serde(default)]
    pub app: AppSettings,
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    pub email_client: EmailClientSettings,
    pub collaborators: CollaboratorSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub recovery: RecoverySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_address")]
    pub address: String,
    #[serde(default)]
    pub allowed_origins: AllowedOrigins,
    #[serde(default = "default_registration_deadline")]
    pub registration_deadline_in_millis: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            address: default_app_address(),
            allowed_origins: AllowedOrigins::default(),
            registration_deadline_in_millis: default_registration_deadline(),
        }
    }
}

impl AppSettings {
    pub fn registration_deadline(&self) -> Duration {
        Duration::from_millis(self.registration_deadline_in_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_host")]
    pub host_name: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host_name: default_redis_host(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailClientSettings {
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
    pub sender: String,
    pub auth_token: Secret<String>,
    #[serde(default = "default_email_timeout")]
    pub timeout_in_millis: u64,
}

impl EmailClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorSettings {
    pub profile_base_url: String,
    pub graph_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_in_millis: u64,
    #[serde(default)]
    pub breaker: BreakerSettings,
}

impl CollaboratorSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_in_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub reset_timeout_in_millis: u64,
    pub max_half_open_requests: u32,
    pub call_timeout_in_millis: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            failure_threshold: defaults.failure_threshold,
            reset_timeout_in_millis: defaults.reset_timeout.as_millis() as u64,
            max_half_open_requests: defaults.max_half_open_requests,
            call_timeout_in_millis: defaults.call_timeout.as_millis() as u64,
        }
    }
}

impl From<&BreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &BreakerSettings) -> Self {
        CircuitBreakerConfig {
            failure_threshold: settings.failure_threshold.max(1),
            reset_timeout: Duration::from_millis(settings.reset_timeout_in_millis),
            max_half_open_requests: settings.max_half_open_requests.max(1),
            call_timeout: Duration::from_millis(settings.call_timeout_in_millis),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: Secret<String>,
    /// Retired signing keys whose tokens are still accepted.
    #[serde(default)]
    pub previous_secrets: Vec<Secret<String>>,
    #[serde(default = "default_jwt_ttl")]
    pub time_to_live: i64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl JwtSettings {
    pub fn keys(&self) -> JwtKeys {
        JwtKeys {
            current: self.secret.clone(),
            previous: self.previous_secrets.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecoverySettings {
    #[serde(default = "default_code_ttl")]
    pub code_ttl_in_seconds: u64,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            code_ttl_in_seconds: default_code_ttl(),
        }
    }
}

impl RecoverySettings {
    pub fn code_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.code_ttl_in_seconds as i64)
    }
}

/// CORS origins allowed to call the service with credentials.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    pub fn new(origins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(origins.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        origin
            .to_str()
            .map(|origin| self.0.iter().any(|allowed| allowed == origin))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for AllowedOrigins {
    fn from(origins: Vec<String>) -> Self {
        Self(
            origins
                .into_iter()
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }
}

impl RoostSettings {
    /// Loads `.env`, then the file named by `ROOST_CONFIG_PATH` (or
    /// `config/base.json`) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!(error = %e, "Failed to read .env file");
        }

        let path = std::env::var(env::CONFIG_PATH_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// Loads settings from an optional JSON file plus the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(env::ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("app.allowed_origins")
                    .with_list_parse_key("jwt.previous_secrets")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<RoostSettings>()?;

        tracing::debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(settings)
    }
}

fn default_app_address() -> String {
    prod::APP_ADDRESS.to_string()
}

fn default_registration_deadline() -> u64 {
    10_000
}

fn default_max_connections() -> u32 {
    5
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_email_base_url() -> String {
    prod::email_client::BASE_URL.to_string()
}

fn default_email_timeout() -> u64 {
    prod::email_client::TIMEOUT.as_millis() as u64
}

fn default_request_timeout() -> u64 {
    3_000
}

fn default_jwt_ttl() -> i64 {
    15 * 60
}

fn default_cookie_name() -> String {
    prod::JWT_COOKIE_NAME.to_string()
}

fn default_code_ttl() -> u64 {
    15 * 60
}
