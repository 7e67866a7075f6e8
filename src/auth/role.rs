/// Login roles.
///
/// Every login is performed *as* one specific role the account must already
/// hold; the three roles correspond to the three client surfaces (admin
/// console, installer app, consumer app). The enumeration is closed: a role
/// string that does not match a variant is a malformed-token error, never a
/// fallback role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Installer,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Installer => "Installer",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Administrator" => Ok(Role::Administrator),
            "Installer" => Ok(Role::Installer),
            "User" => Ok(Role::User),
            other => Err(AuthError::MalformedToken(format!(
                "unrecognized role claim: {}",
                other
            ))
            .into()),
        }
    }
}
