//! # Roost - Account Provisioning Service
//!
//! Facade crate re-exporting the public APIs of the service components.
//!
//! ## Structure
//!
//! - **Core domain types**: `Username`, `Email`, `Password`, `Credential`, etc.
//! - **Ports**: `CredentialStore`, `SagaJournal`, `ProfileClient`, `GraphClient`, ...
//! - **Circuit breaker**: `CircuitBreaker` guarding each collaborator
//! - **Use cases**: `RegistrationSaga`, `VerifyCodeUseCase`, `LoginUseCase`, ...
//! - **Adapters**: Postgres/Redis/in-memory stores, HTTP collaborators, Postmark, JWT
//! - **Service**: `AuthService`, the axum router and server

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use roost_core::*;
}

pub use roost_core::{
    AccountDetails, BusinessProfile, Credential, Email, Gender, Password, Registration,
    RegularProfile, Role, SagaRecord, SagaState, UserId, Username, ValidationError,
    VerificationCode, VerificationStatus,
};

// ============================================================================
// Ports
// ============================================================================

/// Repository and service trait definitions
pub mod ports {
    pub use roost_core::ports::*;
}

pub use roost_core::{
    CollaboratorError, CredentialStore, CredentialStoreError, EmailClient, GraphClient,
    PasswordHasher, ProfileClient, RecoveryRequestStore, SagaJournal, TokenIssuer,
};

pub use roost_core::{BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState};

// ============================================================================
// Use Cases (Application Layer)
// ============================================================================

/// Application use cases
pub mod use_cases {
    pub use roost_application::*;
}

pub use roost_application::{
    ChangePasswordUseCase, LoginUseCase, RecoveryReport, RegistrationError, RegistrationSaga,
    RequestRecoveryCodeUseCase, ResetPasswordUseCase, VerifyCodeUseCase,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Credential, recovery and saga stores
    pub mod persistence {
        pub use roost_adapters::persistence::*;
    }

    /// Profile and graph service clients
    pub mod collaborators {
        pub use roost_adapters::collaborators::*;
    }

    /// Email client implementations
    pub mod email {
        pub use roost_adapters::email::*;
    }

    /// Password hashing and session tokens
    pub mod auth {
        pub use roost_adapters::auth::*;
    }

    /// Configuration
    pub mod config {
        pub use roost_adapters::config::*;
    }
}

pub use roost_adapters::{
    Argon2PasswordHasher, DashMapSagaJournal, HashMapCredentialStore, HashMapRecoveryStore,
    HttpGraphClient, HttpProfileClient, JwtTokenIssuer, MockEmailClient, PostgresCredentialStore,
    PostgresSagaJournal, PostmarkEmailClient, RedisRecoveryStore, RoostSettings,
};

// ============================================================================
// HTTP Layer and Service
// ============================================================================

/// Axum routes and error mapping
pub mod http {
    pub use roost_axum::*;
}

pub use roost_auth_service::{AuthDependencies, AuthService, AuthServiceOptions, helpers};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the ports
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
