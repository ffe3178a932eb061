use std::str::FromStr;

use secrecy::Secret;

use super::{
    email::Email, password::Salt, role::Role, user_id::UserId, username::Username,
    verification_code::VerificationCode,
};

/// Output of the password hasher, stored verbatim.
#[derive(Debug, Clone)]
pub struct HashedPassword(Secret<String>);

impl HashedPassword {
    pub fn new(hash: Secret<String>) -> Self {
        Self(hash)
    }
}

impl AsRef<Secret<String>> for HashedPassword {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            other => Err(format!("unknown verification status '{other}'")),
        }
    }
}

/// The canonical credential record.
#[derive(Debug, Clone)]
pub struct Credential {
    user_id: UserId,
    username: Username,
    email: Email,
    password_hash: HashedPassword,
    salt: Salt,
    role: Role,
    status: VerificationStatus,
    verification_code: VerificationCode,
}

impl Credential {
    /// A freshly registered credential, awaiting email verification.
    pub fn pending(
        user_id: UserId,
        username: Username,
        email: Email,
        password_hash: HashedPassword,
        salt: Salt,
        role: Role,
        verification_code: VerificationCode,
    ) -> Self {
        Self {
            user_id,
            username,
            email,
            password_hash,
            salt,
            role,
            status: VerificationStatus::Pending,
            verification_code,
        }
    }

    /// Rebuilds a credential read back from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        user_id: UserId,
        username: Username,
        email: Email,
        password_hash: HashedPassword,
        salt: Salt,
        role: Role,
        status: VerificationStatus,
        verification_code: VerificationCode,
    ) -> Self {
        Self {
            user_id,
            username,
            email,
            password_hash,
            salt,
            role,
            status,
            verification_code,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &HashedPassword {
        &self.password_hash
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn verification_code(&self) -> &VerificationCode {
        &self.verification_code
    }

    pub fn is_pending(&self) -> bool {
        self.status == VerificationStatus::Pending
    }

    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }

    pub fn mark_verified(&mut self) {
        self.status = VerificationStatus::Verified;
    }

    pub fn set_password_hash(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
    }
}
