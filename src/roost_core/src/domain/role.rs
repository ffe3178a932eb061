use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Business,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Business => "business",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Role::Regular),
            "business" => Ok(Role::Business),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
