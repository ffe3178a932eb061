pub mod change_password;
pub mod code_issuer;
pub mod login;
pub mod recover_password;
pub mod register;
pub mod verify_code;
