use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use roost_core::{
    Credential, CredentialStore, CredentialStoreError, Email, HashedPassword, UserId, Username,
};

/// Both unique indexes live behind one lock so the uniqueness check and the
/// insert are a single step.
#[derive(Default)]
struct Tables {
    by_username: HashMap<Username, Credential>,
    username_by_email: HashMap<Email, Username>,
}

#[derive(Default, Clone)]
pub struct HashMapCredentialStore {
    tables: Arc<RwLock<Tables>>,
}

impl HashMapCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for HashMapCredentialStore {
    async fn add_credential(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        if tables.by_username.contains_key(credential.username()) {
            return Err(CredentialStoreError::UsernameTaken);
        }
        if tables.username_by_email.contains_key(credential.email()) {
            return Err(CredentialStoreError::EmailTaken);
        }

        tables
            .username_by_email
            .insert(credential.email().clone(), credential.username().clone());
        tables
            .by_username
            .insert(credential.username().clone(), credential);
        Ok(())
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, CredentialStoreError> {
        Ok(self.tables.read().await.by_username.contains_key(username))
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError> {
        Ok(self.tables.read().await.username_by_email.contains_key(email))
    }

    async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Credential, CredentialStoreError> {
        let tables = self.tables.read().await;
        tables
            .by_username
            .get(username)
            .cloned()
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Credential, CredentialStoreError> {
        let tables = self.tables.read().await;
        tables
            .username_by_email
            .get(email)
            .and_then(|username| tables.by_username.get(username))
            .cloned()
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn mark_verified(&self, username: &Username) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        let credential = tables
            .by_username
            .get_mut(username)
            .ok_or(CredentialStoreError::NotFound)?;

        if !credential.is_pending() {
            return Err(CredentialStoreError::NotPending);
        }
        credential.mark_verified();
        Ok(())
    }

    async fn set_password_hash(
        &self,
        username: &Username,
        password_hash: HashedPassword,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        let credential = tables
            .by_username
            .get_mut(username)
            .ok_or(CredentialStoreError::NotFound)?;

        credential.set_password_hash(password_hash);
        Ok(())
    }

    async fn delete_credential(&self, user_id: &UserId) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        let Some(username) = tables
            .by_username
            .values()
            .find(|c| c.user_id() == user_id)
            .map(|c| c.username().clone())
        else {
            return Ok(());
        };

        if let Some(credential) = tables.by_username.remove(&username) {
            tables.username_by_email.remove(credential.email());
        }
        Ok(())
    }
}
