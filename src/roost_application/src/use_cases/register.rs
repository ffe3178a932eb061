//! Registration saga spanning the credential store, the profile service and
//! the social graph service.
//!
//! Steps run in order and every state change is journaled before the next
//! step starts. When a step after the credential write fails, the completed
//! steps are undone in reverse order.

use std::{future::Future, sync::Arc, time::Duration};

use roost_core::{
    AccountDetails, CollaboratorError, Credential, CredentialStore, CredentialStoreError,
    EmailClient, GraphClient, GraphNode, PasswordHashError, PasswordHasher, ProfileClient,
    ProfileRecord, Registration, Salt, SagaJournal, SagaJournalError, SagaRecord, SagaState,
    UserId, Username,
};
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::code_issuer::{CodeDeliveryError, VerificationCodeIssuer};

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Failed to deliver verification code: {0}")]
    CodeDelivery(#[from] CodeDeliveryError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("Registration did not finish before its deadline")]
    DeadlineExceeded,
    #[error(
        "Registration failed ({original}) and could not be rolled back: {}",
        .failed.join("; ")
    )]
    InconsistentState {
        original: String,
        failed: Vec<String>,
    },
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] PasswordHashError),
    #[error("Credential store error: {0}")]
    CredentialStore(CredentialStoreError),
    #[error("Saga journal error: {0}")]
    Journal(#[from] SagaJournalError),
}

impl From<CredentialStoreError> for RegistrationError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::UsernameTaken => Self::UsernameTaken,
            CredentialStoreError::EmailTaken => Self::EmailTaken,
            other => Self::CredentialStore(other),
        }
    }
}

/// Identity of a freshly registered, still unverified account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAccount {
    pub user_id: UserId,
    pub username: Username,
}

/// Outcome of [`RegistrationSaga::recover_incomplete`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Sagas that had finished every step and only lacked the final record.
    pub committed: Vec<UserId>,
    pub compensated: Vec<UserId>,
    /// Sagas whose compensation failed again, with the failures.
    pub failed: Vec<(UserId, Vec<String>)>,
}

/// Remote steps to undo, in addition to the credential.
#[derive(Debug, Clone, Copy, Default)]
struct Undo {
    graph: bool,
    profile: bool,
}

impl Undo {
    /// Remote steps a saga journaled in `state` may have completed.
    fn for_state(state: SagaState) -> Self {
        match state {
            SagaState::Initiated | SagaState::CompensatingCredential => Self::default(),
            SagaState::CredentialWritten => Self {
                graph: false,
                profile: true,
            },
            _ => Self {
                graph: true,
                profile: true,
            },
        }
    }
}

pub struct RegistrationSaga<C: ?Sized, E: ?Sized, H: ?Sized, P: ?Sized, G: ?Sized, J: ?Sized> {
    credentials: Arc<C>,
    codes: VerificationCodeIssuer<E>,
    hasher: Arc<H>,
    profiles: Arc<P>,
    graph: Arc<G>,
    journal: Arc<J>,
}

impl<C, E, H, P, G, J> RegistrationSaga<C, E, H, P, G, J>
where
    C: CredentialStore + ?Sized,
    E: EmailClient + ?Sized,
    H: PasswordHasher + ?Sized,
    P: ProfileClient + ?Sized,
    G: GraphClient + ?Sized,
    J: SagaJournal + ?Sized,
{
    pub fn new(
        credentials: Arc<C>,
        email_client: Arc<E>,
        hasher: Arc<H>,
        profiles: Arc<P>,
        graph: Arc<G>,
        journal: Arc<J>,
    ) -> Self {
        Self {
            credentials,
            codes: VerificationCodeIssuer::new(email_client),
            hasher,
            profiles,
            graph,
            journal,
        }
    }

    /// Registers a new account.
    ///
    /// Every step is awaited under `deadline` when one is given. An expired
    /// deadline returns [`RegistrationError::DeadlineExceeded`] and leaves the
    /// journal at the last completed step for [`Self::recover_incomplete`].
    #[tracing::instrument(
        name = "RegistrationSaga::execute",
        skip(self, registration, deadline),
        fields(username = %registration.username, role = %registration.role())
    )]
    pub async fn execute(
        &self,
        registration: Registration,
        deadline: Option<Instant>,
    ) -> Result<RegisteredAccount, RegistrationError> {
        let Registration {
            username,
            email,
            password,
            details,
        } = registration;

        if within(deadline, self.credentials.username_exists(&username)).await?? {
            return Err(RegistrationError::UsernameTaken);
        }
        if within(deadline, self.credentials.email_exists(&email)).await?? {
            return Err(RegistrationError::EmailTaken);
        }

        let salt = Salt::generate();
        let password_hash = within(deadline, self.hasher.hash(&password, &salt)).await??;

        let user_id = UserId::new();
        let code = self.codes.issue();
        let credential = Credential::pending(
            user_id,
            username.clone(),
            email.clone(),
            password_hash,
            salt,
            details.role(),
            code.clone(),
        );

        let mut saga = SagaRecord::new(user_id, username.clone(), SagaState::Initiated);
        self.journal.record(&saga).await?;

        if let Err(e) = within(deadline, self.credentials.add_credential(credential)).await? {
            self.advance(&mut saga, SagaState::Failed).await?;
            return Err(e.into());
        }
        self.advance(&mut saga, SagaState::CredentialWritten).await?;
        tracing::info!(%user_id, "credential written");

        if let Err(e) = within(
            deadline,
            self.codes.send_verification(&email, &username, &code),
        )
        .await?
        {
            return Err(self.compensate(&mut saga, Undo::default(), e.into()).await);
        }

        let profile = ProfileRecord {
            id: user_id,
            username: username.clone(),
            email,
            details: details.clone(),
        };
        if let Err(e) = within(deadline, self.profiles.create_profile(&profile)).await? {
            let undo = Undo {
                graph: false,
                profile: e.is_ambiguous(),
            };
            return Err(self.compensate(&mut saga, undo, e.into()).await);
        }
        self.advance(&mut saga, SagaState::ProfileCreated).await?;

        let node = graph_node(user_id, &username, &details);
        if let Err(e) = within(deadline, self.graph.create_node(&node)).await? {
            let undo = Undo {
                graph: e.is_ambiguous(),
                profile: true,
            };
            return Err(self.compensate(&mut saga, undo, e.into()).await);
        }
        self.advance(&mut saga, SagaState::GraphCreated).await?;
        self.advance(&mut saga, SagaState::Committed).await?;

        tracing::info!(%user_id, "registration committed");
        Ok(RegisteredAccount { user_id, username })
    }

    /// Finishes or rolls back every incomplete saga last journaled more than
    /// `stale_after` ago.
    ///
    /// Sagas touched within `stale_after` are assumed to still be running and
    /// are left alone, so `stale_after` should be at least the registration
    /// deadline. Remote deletes are idempotent, so steps that may or may not
    /// have landed are deleted unconditionally.
    #[tracing::instrument(name = "RegistrationSaga::recover_incomplete", skip(self))]
    pub async fn recover_incomplete(
        &self,
        stale_after: Duration,
    ) -> Result<RecoveryReport, RegistrationError> {
        let mut report = RecoveryReport::default();
        let cutoff = chrono::Duration::from_std(stale_after)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        for mut saga in self.journal.incomplete(cutoff).await? {
            let saga_id = saga.saga_id;

            if saga.state == SagaState::GraphCreated {
                self.advance(&mut saga, SagaState::Committed).await?;
                report.committed.push(saga_id);
                continue;
            }

            let undo = Undo::for_state(saga.state);
            let failures = self.undo(&mut saga, undo).await;
            if failures.is_empty() {
                report.compensated.push(saga_id);
            } else {
                tracing::error!(
                    %saga_id,
                    state = %saga.state,
                    failures = ?failures,
                    "saga recovery could not compensate"
                );
                report.failed.push((saga_id, failures));
            }
        }

        Ok(report)
    }

    async fn advance(
        &self,
        saga: &mut SagaRecord,
        state: SagaState,
    ) -> Result<(), SagaJournalError> {
        let next = saga.advance(state);
        self.journal.record(&next).await?;
        *saga = next;
        Ok(())
    }

    /// Undoes the completed steps and returns the error to report.
    async fn compensate(
        &self,
        saga: &mut SagaRecord,
        undo: Undo,
        original: RegistrationError,
    ) -> RegistrationError {
        tracing::warn!(
            saga_id = %saga.saga_id,
            error = %original,
            "registration step failed, compensating"
        );

        let failed = self.undo(saga, undo).await;
        if failed.is_empty() {
            return original;
        }

        tracing::error!(
            saga_id = %saga.saga_id,
            original = %original,
            failed = ?failed,
            "registration compensation failed"
        );
        RegistrationError::InconsistentState {
            original: original.to_string(),
            failed,
        }
    }

    /// Deletes graph node, profile and credential in that order.
    ///
    /// A failed remote delete stops the rollback in `CompensatingProfile`,
    /// keeping the credential, so recovery retries the remote deletes. The
    /// journal reaches `Failed` only when every delete succeeded. Returns the
    /// failures.
    async fn undo(&self, saga: &mut SagaRecord, undo: Undo) -> Vec<String> {
        let saga_id = saga.saga_id;
        let mut failed = Vec::new();

        if undo.graph || undo.profile {
            self.journal_step(saga, SagaState::CompensatingProfile, &mut failed)
                .await;
        }
        if undo.graph
            && let Err(e) = self.graph.delete_node(&saga_id).await
        {
            failed.push(format!("graph node delete: {e}"));
        }
        if undo.profile
            && let Err(e) = self.profiles.delete_profile(&saga_id).await
        {
            failed.push(format!("profile delete: {e}"));
        }
        if !failed.is_empty() {
            return failed;
        }

        self.journal_step(saga, SagaState::CompensatingCredential, &mut failed)
            .await;
        if let Err(e) = self.credentials.delete_credential(&saga_id).await {
            failed.push(format!("credential delete: {e}"));
        }

        if failed.is_empty() {
            self.journal_step(saga, SagaState::Failed, &mut failed).await;
        }
        failed
    }

    async fn journal_step(&self, saga: &mut SagaRecord, state: SagaState, failed: &mut Vec<String>) {
        if let Err(e) = self.advance(saga, state).await {
            failed.push(format!("journal {state}: {e}"));
        }
    }
}

fn graph_node(id: UserId, username: &Username, details: &AccountDetails) -> GraphNode {
    GraphNode {
        id,
        role: details.role(),
        name: details.display_name(),
        username: username.clone(),
    }
}

async fn within<F: Future>(
    deadline: Option<Instant>,
    step: F,
) -> Result<F::Output, RegistrationError> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, step)
            .await
            .map_err(|_| RegistrationError::DeadlineExceeded),
        None => Ok(step.await),
    }
}
