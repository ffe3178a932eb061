use std::sync::Arc;

use askama::Template;
use roost_core::{Email, EmailClient, EmailError, Username, VerificationCode};

const VERIFICATION_SUBJECT: &str = "Verify your account";
const RECOVERY_SUBJECT: &str = "Password recovery code";

#[derive(Template)]
#[template(
    source = "Hi {{ username }},\n\nYour verification code is {{ code }}.\nEnter it to activate your account.\n",
    ext = "txt"
)]
struct VerificationEmail<'a> {
    username: &'a str,
    code: &'a str,
}

#[derive(Template)]
#[template(
    source = "Someone asked to reset the password of this account.\n\nYour recovery code is {{ code }}.\nIf this was not you, ignore this email.\n",
    ext = "txt"
)]
struct RecoveryEmail<'a> {
    code: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum CodeDeliveryError {
    #[error("Failed to render email: {0}")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Generates one-time codes and delivers them by email.
pub struct VerificationCodeIssuer<E: ?Sized> {
    email_client: Arc<E>,
}

impl<E> VerificationCodeIssuer<E>
where
    E: EmailClient + ?Sized,
{
    pub fn new(email_client: Arc<E>) -> Self {
        Self { email_client }
    }

    pub fn issue(&self) -> VerificationCode {
        VerificationCode::generate()
    }

    #[tracing::instrument(
        name = "VerificationCodeIssuer::send_verification",
        skip(self, recipient, code)
    )]
    pub async fn send_verification(
        &self,
        recipient: &Email,
        username: &Username,
        code: &VerificationCode,
    ) -> Result<(), CodeDeliveryError> {
        let body = VerificationEmail {
            username: username.as_str(),
            code: code.as_str(),
        }
        .render()?;

        self.email_client
            .send_email(recipient, VERIFICATION_SUBJECT, &body)
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "VerificationCodeIssuer::send_recovery", skip_all)]
    pub async fn send_recovery(
        &self,
        recipient: &Email,
        code: &VerificationCode,
    ) -> Result<(), CodeDeliveryError> {
        let body = RecoveryEmail {
            code: code.as_str(),
        }
        .render()?;

        self.email_client
            .send_email(recipient, RECOVERY_SUBJECT, &body)
            .await?;
        Ok(())
    }
}
