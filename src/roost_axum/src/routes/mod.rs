//! Route handlers. Each handler parses its JSON body into domain types,
//! calls one use case and maps the outcome to a response.

pub mod change_password;
pub mod login;
pub mod recovery;
pub mod signup;
pub mod validate_code;

pub use change_password::change_password;
pub use login::login;
pub use recovery::{code_recovery, recovery_password};
pub use signup::{signup_business, signup_regular};
pub use validate_code::validate_code;
