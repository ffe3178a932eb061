use std::sync::Arc;

use redis::{Client, RedisResult};
use reqwest::{Client as HttpClient, Url};
use roost_adapters::{
    Argon2PasswordHasher, CollaboratorEndpoint, HttpGraphClient, HttpProfileClient,
    JwtTokenIssuer, PostgresCredentialStore, PostgresSagaJournal, PostmarkEmailClient,
    RedisRecoveryStore, RoostSettings,
};
use roost_core::{CircuitBreaker, CircuitBreakerConfig, Email};
use secrecy::{ExposeSecret, Secret};
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth_service::{AuthDependencies, AuthServiceOptions};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Postgres: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("Migrations: {0}")]
    Migrations(#[from] sqlx::migrate::MigrateError),
    #[error("Redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Invalid setting {setting}: {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },
}

fn invalid(setting: &'static str) -> impl FnOnce(String) -> StartupError {
    move |message| StartupError::InvalidSetting { setting, message }
}

/// Connects to Postgres and runs pending migrations.
pub async fn configure_postgresql(settings: &RoostSettings) -> Result<PgPool, StartupError> {
    let pg_pool = get_postgres_pool(
        settings.postgres.url.expose_secret(),
        settings.postgres.max_connections,
    )
    .await?;

    sqlx::migrate!().run(&pg_pool).await?;

    Ok(pg_pool)
}

pub async fn get_postgres_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

pub fn configure_redis(settings: &RoostSettings) -> RedisResult<redis::Connection> {
    get_redis_client(&settings.redis.host_name)?.get_connection()
}

pub fn get_redis_client(redis_hostname: &str) -> RedisResult<Client> {
    let redis_url = format!("redis://{}/", redis_hostname);
    redis::Client::open(redis_url)
}

/// HTTP client for one collaborator with its own named breaker.
pub fn collaborator_endpoint(
    name: &'static str,
    base_url: &str,
    settings: &RoostSettings,
) -> Result<CollaboratorEndpoint, StartupError> {
    let base_url =
        Url::parse(base_url).map_err(|e| invalid("collaborators base url")(e.to_string()))?;
    let breaker = CircuitBreaker::new(
        name,
        CircuitBreakerConfig::from(&settings.collaborators.breaker),
    );

    Ok(CollaboratorEndpoint::new(
        HttpClient::new(),
        base_url,
        settings.collaborators.request_timeout(),
        breaker,
    ))
}

/// Production adapters: Postgres, Redis, Postmark and the HTTP collaborators.
pub fn production_dependencies(
    settings: &RoostSettings,
    pg_pool: PgPool,
    redis_conn: redis::Connection,
    tokens: Arc<JwtTokenIssuer>,
) -> Result<AuthDependencies, StartupError> {
    let http_client = HttpClient::builder()
        .timeout(settings.email_client.timeout())
        .build()?;
    let sender = Email::try_from(Secret::new(settings.email_client.sender.clone()))
        .map_err(|e| invalid("email_client.sender")(e.to_string()))?;
    let email_client = PostmarkEmailClient::new(
        settings.email_client.base_url.clone(),
        sender,
        settings.email_client.auth_token.clone(),
        http_client,
    );

    let profiles = HttpProfileClient::new(collaborator_endpoint(
        "profile",
        &settings.collaborators.profile_base_url,
        settings,
    )?);
    let graph = HttpGraphClient::new(collaborator_endpoint(
        "graph",
        &settings.collaborators.graph_base_url,
        settings,
    )?);

    Ok(AuthDependencies {
        credentials: Arc::new(PostgresCredentialStore::new(pg_pool.clone())),
        recovery_requests: Arc::new(RedisRecoveryStore::new(
            Arc::new(RwLock::new(redis_conn)),
            settings.recovery.code_ttl_in_seconds,
        )),
        journal: Arc::new(PostgresSagaJournal::new(pg_pool)),
        email_client: Arc::new(email_client),
        hasher: Arc::new(Argon2PasswordHasher::new()),
        tokens,
        profiles: Arc::new(profiles),
        graph: Arc::new(graph),
    })
}

pub fn service_options(settings: &RoostSettings) -> AuthServiceOptions {
    AuthServiceOptions {
        cookie_name: settings.jwt.cookie_name.clone(),
        registration_deadline: settings.app.registration_deadline(),
        recovery_code_ttl: settings.recovery.code_ttl(),
    }
}
