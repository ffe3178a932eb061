use std::{sync::Arc, time::Duration};

use roost_application::{
    ChangePasswordUseCase, LoginUseCase, RegistrationSaga, RequestRecoveryCodeUseCase,
    ResetPasswordUseCase, VerifyCodeUseCase,
};
use roost_core::{
    CredentialStore, EmailClient, GraphClient, PasswordHasher, ProfileClient,
    RecoveryRequestStore, SagaJournal, TokenIssuer,
};

use crate::session::SessionConfig;

pub type DynRegistrationSaga = RegistrationSaga<
    dyn CredentialStore,
    dyn EmailClient,
    dyn PasswordHasher,
    dyn ProfileClient,
    dyn GraphClient,
    dyn SagaJournal,
>;
pub type DynVerifyCode = VerifyCodeUseCase<dyn CredentialStore>;
pub type DynLogin = LoginUseCase<dyn CredentialStore, dyn PasswordHasher, dyn TokenIssuer>;
pub type DynChangePassword = ChangePasswordUseCase<dyn CredentialStore, dyn PasswordHasher>;
pub type DynRequestRecoveryCode =
    RequestRecoveryCodeUseCase<dyn CredentialStore, dyn RecoveryRequestStore, dyn EmailClient>;
pub type DynResetPassword =
    ResetPasswordUseCase<dyn CredentialStore, dyn RecoveryRequestStore, dyn PasswordHasher>;

#[derive(Clone)]
pub struct SignupState {
    pub saga: Arc<DynRegistrationSaga>,
    /// Time a registration may take end to end.
    pub deadline: Duration,
}

#[derive(Clone)]
pub struct LoginState {
    pub login: Arc<DynLogin>,
    pub session: SessionConfig,
}

#[derive(Clone)]
pub struct ChangePasswordState {
    pub change_password: Arc<DynChangePassword>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub session: SessionConfig,
}
