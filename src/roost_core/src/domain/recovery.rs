use chrono::{DateTime, Duration, Utc};

use super::{email::Email, verification_code::VerificationCode};

/// An outstanding password-recovery code. One per email; a new request replaces the old one.
#[derive(Debug, Clone)]
pub struct RecoveryRequest {
    email: Email,
    code: VerificationCode,
    issued_at: DateTime<Utc>,
}

impl RecoveryRequest {
    pub fn new(email: Email, code: VerificationCode) -> Self {
        Self::restore(email, code, Utc::now())
    }

    pub fn restore(email: Email, code: VerificationCode, issued_at: DateTime<Utc>) -> Self {
        Self {
            email,
            code,
            issued_at,
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn code(&self) -> &VerificationCode {
        &self.code
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.issued_at >= ttl
    }

    pub fn matches(&self, email: &Email, code: &VerificationCode) -> bool {
        &self.email == email && &self.code == code
    }
}
