use std::sync::{Arc, LazyLock};

use chrono::DateTime;
use redis::{Commands, Connection, Script};
use roost_core::{Email, RecoveryRequest, RecoveryRequestStore, RecoveryStoreError, VerificationCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Recovery requests in Redis, one key per email, expiring after `code_ttl` seconds.
#[derive(Clone)]
pub struct RedisRecoveryStore {
    conn: Arc<RwLock<Connection>>,
    code_ttl: u64,
}

impl RedisRecoveryStore {
    pub fn new(conn: Arc<RwLock<Connection>>, code_ttl: u64) -> Self {
        Self { conn, code_ttl }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredRequest {
    code: String,
    issued_at_ms: i64,
}

#[async_trait::async_trait]
impl RecoveryRequestStore for RedisRecoveryStore {
    #[tracing::instrument(name = "Storing recovery request in Redis", skip_all)]
    async fn store_request(&self, request: RecoveryRequest) -> Result<(), RecoveryStoreError> {
        let key = get_key(request.email());
        let value = serde_json::to_string(&StoredRequest {
            code: request.code().as_str().to_string(),
            issued_at_ms: request.issued_at().timestamp_millis(),
        })
        .map_err(|e| RecoveryStoreError::UnexpectedError(e.to_string()))?;

        let mut conn = self.conn.write().await;
        conn.set_ex(key, value, self.code_ttl)
            .map_err(|e| RecoveryStoreError::UnexpectedError(e.to_string()))
    }

    #[tracing::instrument(name = "Reading recovery request from Redis", skip_all)]
    async fn get_request(&self, email: &Email) -> Result<RecoveryRequest, RecoveryStoreError> {
        let key = get_key(email);
        let mut conn = self.conn.write().await;
        let value: Option<String> = conn
            .get(&key)
            .map_err(|e| RecoveryStoreError::UnexpectedError(e.to_string()))?;

        let Some(value) = value else {
            return Err(RecoveryStoreError::NotFound);
        };
        parse_request(email, &value)
    }

    #[tracing::instrument(name = "Redeeming recovery request in Redis", skip_all)]
    async fn take_request(
        &self,
        email: &Email,
        code: &VerificationCode,
    ) -> Result<RecoveryRequest, RecoveryStoreError> {
        let key = get_key(email);
        let mut conn = self.conn.write().await;
        let value: Option<String> = TAKE_IF_CODE_MATCHES
            .key(&key)
            .arg(code.as_str())
            .invoke(&mut *conn)
            .map_err(|e| RecoveryStoreError::UnexpectedError(e.to_string()))?;

        let Some(value) = value else {
            return Err(RecoveryStoreError::NotFound);
        };
        let request = parse_request(email, &value)?;
        if request.code() != code {
            return Err(RecoveryStoreError::CodeMismatch);
        }
        Ok(request)
    }
}

/// Returns the stored request and deletes it only if its code is `ARGV[1]`.
static TAKE_IF_CODE_MATCHES: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        local stored = redis.call('GET', KEYS[1])
        if not stored then
            return nil
        end
        if cjson.decode(stored).code == ARGV[1] then
            redis.call('DEL', KEYS[1])
        end
        return stored
        ",
    )
});

fn parse_request(email: &Email, value: &str) -> Result<RecoveryRequest, RecoveryStoreError> {
    let stored: StoredRequest = serde_json::from_str(value)
        .map_err(|e| RecoveryStoreError::UnexpectedError(e.to_string()))?;
    let code = VerificationCode::parse(&stored.code)
        .map_err(|e| RecoveryStoreError::UnexpectedError(e.to_string()))?;
    let issued_at = DateTime::from_timestamp_millis(stored.issued_at_ms).ok_or_else(|| {
        RecoveryStoreError::UnexpectedError("issue time out of range".to_string())
    })?;

    Ok(RecoveryRequest::restore(email.clone(), code, issued_at))
}

const RECOVERY_CODE_KEY_PREFIX: &str = "recovery_code:";

fn get_key(email: &Email) -> String {
    format!("{}{}", RECOVERY_CODE_KEY_PREFIX, email.as_ref().expose_secret())
}
