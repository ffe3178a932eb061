pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use use_cases::{
    change_password::{ChangePasswordError, ChangePasswordUseCase},
    code_issuer::{CodeDeliveryError, VerificationCodeIssuer},
    login::{LoginError, LoginUseCase},
    recover_password::{
        RecoveryError, RequestRecoveryCodeUseCase, ResetPasswordUseCase,
    },
    register::{
        RecoveryReport, RegisteredAccount, RegistrationError, RegistrationSaga,
    },
    verify_code::{VerifyCodeError, VerifyCodeUseCase},
};
