pub mod credential;
pub mod email;
pub mod password;
pub mod recovery;
pub mod registration;
pub mod role;
pub mod saga;
pub mod user_id;
pub mod username;
pub mod validation;
pub mod verification_code;
