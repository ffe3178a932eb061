//! In-memory fakes of the core ports shared by the use case tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_core::{
    CollaboratorError, Credential, CredentialStore, CredentialStoreError, Email, EmailClient,
    EmailError, GraphClient, GraphNode, HashedPassword, Password, PasswordHashError,
    PasswordHasher, ProfileClient, ProfileRecord, RecoveryRequest, RecoveryRequestStore,
    RecoveryStoreError, Role, Salt, SagaJournal, SagaJournalError, SagaRecord, SagaState,
    SessionClaims, SessionToken, TokenError, TokenIssuer, UserId, Username, VerificationCode,
};
use secrecy::{ExposeSecret, Secret};

pub fn email(raw: &str) -> Email {
    Email::try_from(Secret::from(raw.to_string())).unwrap()
}

pub fn password(raw: &str) -> Password {
    Password::try_from(Secret::from(raw.to_string())).unwrap()
}

pub fn secret(raw: &str) -> Secret<String> {
    Secret::from(raw.to_string())
}

/// A verified credential whose hash was produced by [`PlainHasher`].
pub fn verified_credential(username: &str, address: &str, raw_password: &str) -> Credential {
    let salt = Salt::generate();
    let hash = PlainHasher::digest(&secret(raw_password), &salt);
    let mut credential = Credential::pending(
        UserId::new(),
        Username::parse(username).unwrap(),
        email(address),
        hash,
        salt,
        Role::Regular,
        VerificationCode::generate(),
    );
    credential.mark_verified();
    credential
}

// ============================================================================
// Credential store
// ============================================================================

#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<Username, Credential>>,
    /// Makes the existence checks lie, as if a concurrent registration won the race.
    pub hide_existing: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn with(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let store = Self::default();
        {
            let mut map = store.credentials.lock().unwrap();
            for credential in credentials {
                map.insert(credential.username().clone(), credential);
            }
        }
        store
    }

    pub fn get(&self, username: &str) -> Option<Credential> {
        let username = Username::parse(username).unwrap();
        self.credentials.lock().unwrap().get(&username).cloned()
    }

    pub fn len(&self) -> usize {
        self.credentials.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn add_credential(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        let mut credentials = self.credentials.lock().unwrap();
        if credentials.contains_key(credential.username()) {
            return Err(CredentialStoreError::UsernameTaken);
        }
        if credentials.values().any(|c| c.email() == credential.email()) {
            return Err(CredentialStoreError::EmailTaken);
        }
        credentials.insert(credential.username().clone(), credential);
        Ok(())
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, CredentialStoreError> {
        if self.hide_existing.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.credentials.lock().unwrap().contains_key(username))
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError> {
        if self.hide_existing.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .values()
            .any(|c| c.email() == email))
    }

    async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Credential, CredentialStoreError> {
        self.credentials
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Credential, CredentialStoreError> {
        self.credentials
            .lock()
            .unwrap()
            .values()
            .find(|c| c.email() == email)
            .cloned()
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn mark_verified(&self, username: &Username) -> Result<(), CredentialStoreError> {
        let mut credentials = self.credentials.lock().unwrap();
        let credential = credentials
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
        let mut credentials = self.credentials.lock().unwrap();
        let credential = credentials
            .get_mut(username)
            .ok_or(CredentialStoreError::NotFound)?;
        credential.set_password_hash(password_hash);
        Ok(())
    }

    async fn delete_credential(&self, user_id: &UserId) -> Result<(), CredentialStoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::UnexpectedError(
                "database unavailable".to_string(),
            ));
        }
        self.credentials
            .lock()
            .unwrap()
            .retain(|_, c| c.user_id() != user_id);
        Ok(())
    }
}

// ============================================================================
// Recovery store
// ============================================================================

#[derive(Default)]
pub struct MemoryRecoveryStore {
    requests: Mutex<HashMap<Email, RecoveryRequest>>,
}

impl MemoryRecoveryStore {
    pub fn get(&self, address: &str) -> Option<RecoveryRequest> {
        self.requests.lock().unwrap().get(&email(address)).cloned()
    }

    pub fn insert(&self, request: RecoveryRequest) {
        self.requests
            .lock()
            .unwrap()
            .insert(request.email().clone(), request);
    }
}

#[async_trait]
impl RecoveryRequestStore for MemoryRecoveryStore {
    async fn store_request(&self, request: RecoveryRequest) -> Result<(), RecoveryStoreError> {
        self.insert(request);
        Ok(())
    }

    async fn get_request(&self, email: &Email) -> Result<RecoveryRequest, RecoveryStoreError> {
        self.requests
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or(RecoveryStoreError::NotFound)
    }

    async fn take_request(
        &self,
        email: &Email,
        code: &VerificationCode,
    ) -> Result<RecoveryRequest, RecoveryStoreError> {
        let mut requests = self.requests.lock().unwrap();
        match requests.get(email) {
            None => Err(RecoveryStoreError::NotFound),
            Some(request) if request.code() != code => Err(RecoveryStoreError::CodeMismatch),
            Some(_) => requests.remove(email).ok_or(RecoveryStoreError::NotFound),
        }
    }
}

// ============================================================================
// Saga journal
// ============================================================================

#[derive(Default)]
pub struct MemoryJournal {
    latest: Mutex<HashMap<UserId, SagaRecord>>,
    history: Mutex<Vec<SagaState>>,
}

impl MemoryJournal {
    pub fn history(&self) -> Vec<SagaState> {
        self.history.lock().unwrap().clone()
    }

    pub fn state_of(&self, saga_id: &UserId) -> Option<SagaState> {
        self.latest.lock().unwrap().get(saga_id).map(|r| r.state)
    }
}

#[async_trait]
impl SagaJournal for MemoryJournal {
    async fn record(&self, record: &SagaRecord) -> Result<(), SagaJournalError> {
        self.history.lock().unwrap().push(record.state);
        self.latest
            .lock()
            .unwrap()
            .insert(record.saga_id, record.clone());
        Ok(())
    }

    async fn incomplete(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SagaRecord>, SagaJournalError> {
        Ok(self
            .latest
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.state.is_terminal() && r.updated_at <= cutoff)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Email
// ============================================================================

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub content: String,
}

#[derive(Default)]
pub struct RecordingEmailClient {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingEmailClient {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// The six-digit code in the most recent email.
    pub fn last_code(&self) -> VerificationCode {
        let sent = self.sent();
        let content = &sent.last().expect("an email was sent").content;
        let digits: String = content
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .expect("email carries a code")
            .to_string();
        VerificationCode::parse(&digits).unwrap()
    }
}

#[async_trait]
impl EmailClient for RecordingEmailClient {
    async fn send_email(
        &self,
        recipient: &Email,
        subject: &str,
        content: &str,
    ) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError("provider unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.as_ref().expose_secret().clone(),
            subject: subject.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Hashing and tokens
// ============================================================================

/// Reversible stand-in for the real hasher.
pub struct PlainHasher;

impl PlainHasher {
    pub fn digest(candidate: &Secret<String>, salt: &Salt) -> HashedPassword {
        HashedPassword::new(Secret::new(format!(
            "plain${}",
            salt.season(candidate).expose_secret()
        )))
    }
}

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(
        &self,
        password: &Password,
        salt: &Salt,
    ) -> Result<HashedPassword, PasswordHashError> {
        Ok(Self::digest(password.as_ref(), salt))
    }

    async fn verify(
        &self,
        candidate: &Secret<String>,
        salt: &Salt,
        expected: &HashedPassword,
    ) -> Result<(), PasswordHashError> {
        let actual = Self::digest(candidate, salt);
        if actual.as_ref().expose_secret() == expected.as_ref().expose_secret() {
            Ok(())
        } else {
            Err(PasswordHashError::Mismatch)
        }
    }
}

pub struct FakeTokenIssuer;

impl TokenIssuer for FakeTokenIssuer {
    fn issue(&self, username: &Username, role: Role) -> Result<SessionToken, TokenError> {
        Ok(SessionToken::new(format!("{username}:{role}")))
    }

    fn validate(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let (username, role) = token.split_once(':').ok_or(TokenError::Invalid)?;
        Ok(SessionClaims {
            username: username.to_string(),
            role: role.parse().map_err(|_| TokenError::Invalid)?,
            expires_at: i64::MAX,
        })
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Scripted profile or graph service that records every call.
pub struct FakeCollaborator {
    name: &'static str,
    create_error: Mutex<Option<CollaboratorError>>,
    delete_error: Mutex<Option<CollaboratorError>>,
    create_delay: Mutex<Option<Duration>>,
    created: Mutex<Vec<UserId>>,
    deleted: Mutex<Vec<UserId>>,
}

impl FakeCollaborator {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            create_error: Mutex::new(None),
            delete_error: Mutex::new(None),
            create_delay: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_with_status(self, status: u16) -> Self {
        *self.create_error.lock().unwrap() = Some(CollaboratorError::Status {
            collaborator: self.name.to_string(),
            status,
        });
        self
    }

    pub fn failing_with(self, error: CollaboratorError) -> Self {
        *self.create_error.lock().unwrap() = Some(error);
        self
    }

    pub fn failing_deletes(self) -> Self {
        *self.delete_error.lock().unwrap() = Some(CollaboratorError::Transport {
            collaborator: self.name.to_string(),
            message: "connection refused".to_string(),
        });
        self
    }

    pub fn heal_deletes(&self) {
        *self.delete_error.lock().unwrap() = None;
    }

    pub fn slow(self, delay: Duration) -> Self {
        *self.create_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn created(&self) -> Vec<UserId> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<UserId> {
        self.deleted.lock().unwrap().clone()
    }

    async fn create(&self, id: UserId) -> Result<(), CollaboratorError> {
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let error = self.create_error.lock().unwrap().clone();
        match error {
            Some(error) => Err(error),
            None => {
                self.created.lock().unwrap().push(id);
                Ok(())
            }
        }
    }

    fn delete(&self, id: UserId) -> Result<(), CollaboratorError> {
        self.deleted.lock().unwrap().push(id);
        match self.delete_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProfileClient for FakeCollaborator {
    async fn create_profile(&self, profile: &ProfileRecord) -> Result<(), CollaboratorError> {
        self.create(profile.id).await
    }

    async fn delete_profile(&self, id: &UserId) -> Result<(), CollaboratorError> {
        self.delete(*id)
    }
}

#[async_trait]
impl GraphClient for FakeCollaborator {
    async fn create_node(&self, node: &GraphNode) -> Result<(), CollaboratorError> {
        self.create(node.id).await
    }

    async fn delete_node(&self, id: &UserId) -> Result<(), CollaboratorError> {
        self.delete(*id)
    }
}
