use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

use super::{user_id::UserId, username::Username};

/// Registration saga states.
///
/// ```text
/// Initiated -> CredentialWritten -> ProfileCreated -> GraphCreated -> Committed
///                    |                    |
///                    |                    +-> CompensatingProfile -+
///                    +-----------------------------------------------+-> CompensatingCredential -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaState {
    Initiated,
    CredentialWritten,
    ProfileCreated,
    GraphCreated,
    Committed,
    CompensatingProfile,
    CompensatingCredential,
    Failed,
}

impl SagaState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Committed | SagaState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Initiated => "initiated",
            SagaState::CredentialWritten => "credential_written",
            SagaState::ProfileCreated => "profile_created",
            SagaState::GraphCreated => "graph_created",
            SagaState::Committed => "committed",
            SagaState::CompensatingProfile => "compensating_profile",
            SagaState::CompensatingCredential => "compensating_credential",
            SagaState::Failed => "failed",
        }
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SagaState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s {
            "initiated" => SagaState::Initiated,
            "credential_written" => SagaState::CredentialWritten,
            "profile_created" => SagaState::ProfileCreated,
            "graph_created" => SagaState::GraphCreated,
            "committed" => SagaState::Committed,
            "compensating_profile" => SagaState::CompensatingProfile,
            "compensating_credential" => SagaState::CompensatingCredential,
            "failed" => SagaState::Failed,
            other => return Err(format!("unknown saga state '{other}'")),
        };
        Ok(state)
    }
}

/// One journal entry: the last state a registration saga reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaRecord {
    pub saga_id: UserId,
    pub username: Username,
    pub state: SagaState,
    pub updated_at: DateTime<Utc>,
}

impl SagaRecord {
    pub fn new(saga_id: UserId, username: Username, state: SagaState) -> Self {
        Self {
            saga_id,
            username,
            state,
            updated_at: Utc::now(),
        }
    }

    /// The same saga moved to `state`, timestamped now.
    pub fn advance(&self, state: SagaState) -> Self {
        Self::new(self.saga_id, self.username.clone(), state)
    }
}
