use std::str::FromStr;

use super::{
    email::Email,
    password::Password,
    role::Role,
    username::Username,
    validation::{ValidationError, letters_only, required},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match required("gender", s)? {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(ValidationError::InvalidGender),
        }
    }
}

/// Profile fields of a personal account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularProfile {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u16,
    pub city: String,
}

impl RegularProfile {
    pub fn parse(
        first_name: &str,
        last_name: &str,
        gender: &str,
        age: &str,
        city: &str,
    ) -> Result<Self, ValidationError> {
        let first_name = letters_only("First name", first_name)?;
        let last_name = letters_only("Last name", last_name)?;
        let gender = gender.parse()?;

        let age = required("age", age)?;
        if !age.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidAge);
        }
        let age = age.parse().map_err(|_| ValidationError::InvalidAge)?;

        let city = letters_only("City", city)?;

        Ok(Self {
            first_name,
            last_name,
            gender,
            age,
            city,
        })
    }
}

/// Profile fields of a business account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessProfile {
    pub company: String,
    pub website: String,
}

impl BusinessProfile {
    pub fn parse(company: &str, website: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            company: required("company", company)?.to_owned(),
            website: required("website", website)?.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountDetails {
    Regular(RegularProfile),
    Business(BusinessProfile),
}

impl AccountDetails {
    pub fn role(&self) -> Role {
        match self {
            AccountDetails::Regular(_) => Role::Regular,
            AccountDetails::Business(_) => Role::Business,
        }
    }

    /// The name shown on the social graph node.
    pub fn display_name(&self) -> String {
        match self {
            AccountDetails::Regular(profile) => {
                format!("{} {}", profile.first_name, profile.last_name)
            }
            AccountDetails::Business(profile) => profile.company.clone(),
        }
    }
}

/// A validated sign-up request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub email: Email,
    pub password: Password,
    pub details: AccountDetails,
}

impl Registration {
    pub fn new(username: Username, email: Email, password: Password, details: AccountDetails) -> Self {
        Self {
            username,
            email,
            password,
            details,
        }
    }

    pub fn role(&self) -> Role {
        self.details.role()
    }
}
