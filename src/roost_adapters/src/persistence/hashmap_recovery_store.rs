use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use roost_core::{Email, RecoveryRequest, RecoveryRequestStore, RecoveryStoreError, VerificationCode};

/// In-memory recovery requests. Expiry is left to the caller, which checks
/// the request's issue time.
#[derive(Default, Clone)]
pub struct HashMapRecoveryStore {
    requests: Arc<RwLock<HashMap<Email, RecoveryRequest>>>,
}

impl HashMapRecoveryStore {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl RecoveryRequestStore for HashMapRecoveryStore {
    async fn store_request(&self, request: RecoveryRequest) -> Result<(), RecoveryStoreError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.email().clone(), request);
        Ok(())
    }

    async fn get_request(&self, email: &Email) -> Result<RecoveryRequest, RecoveryStoreError> {
        let requests = self.requests.read().await;
        requests
            .get(email)
            .cloned()
            .ok_or(RecoveryStoreError::NotFound)
    }

    async fn take_request(
        &self,
        email: &Email,
        code: &VerificationCode,
    ) -> Result<RecoveryRequest, RecoveryStoreError> {
        let mut requests = self.requests.write().await;
        match requests.get(email) {
            None => Err(RecoveryStoreError::NotFound),
            Some(request) if request.code() != code => Err(RecoveryStoreError::CodeMismatch),
            Some(_) => requests.remove(email).ok_or(RecoveryStoreError::NotFound),
        }
    }
}
