//! Axum routes for the roost account service.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  roost_application: use cases            │
//! └──────────────┬───────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────────────────┐
//! │  roost_axum                              │
//! │  - JSON request bodies -> domain types   │
//! │  - use case errors -> ApiError -> status │
//! │  - session token extraction and cookie   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Every route takes its own state, so a router only needs the pieces the
//! mounted routes use.

pub mod error;
pub mod routes;
pub mod session;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use session::{SessionConfig, create_auth_cookie, extract_token};
pub use state::{
    ChangePasswordState, DynChangePassword, DynLogin, DynRegistrationSaga,
    DynRequestRecoveryCode, DynResetPassword, DynVerifyCode, LoginState, SignupState,
};
