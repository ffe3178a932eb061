pub mod circuit_breaker;
pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    credential::{Credential, HashedPassword, VerificationStatus},
    email::Email,
    password::{Password, Salt},
    recovery::RecoveryRequest,
    registration::{AccountDetails, BusinessProfile, Gender, RegularProfile, Registration},
    role::Role,
    saga::{SagaRecord, SagaState},
    user_id::UserId,
    username::Username,
    validation::ValidationError,
    verification_code::VerificationCode,
};

pub use ports::{
    repositories::{
        CredentialStore, CredentialStoreError, RecoveryRequestStore, RecoveryStoreError,
        SagaJournal, SagaJournalError,
    },
    services::{
        CollaboratorError, EmailClient, EmailError, GraphClient, GraphNode, PasswordHashError,
        PasswordHasher, ProfileClient, ProfileRecord, SessionClaims, SessionToken, TokenError,
        TokenIssuer,
    },
};

pub use circuit_breaker::{BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState};
