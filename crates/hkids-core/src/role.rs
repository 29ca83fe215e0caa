//! User roles and capabilities.
//!
//! Roles form a closed enumeration; handlers ask the role for a capability
//! instead of comparing strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// The role assigned to a user account. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator: manages the library (books, categories).
    Admin,

    /// Parent account: owns kid profiles and sets category approvals.
    Parent,

    /// Kid account: read-only access gated by parent approvals.
    Kid,
}

impl Role {
    /// Whether this role may create, update, or delete books and categories.
    #[must_use]
    pub const fn can_manage_library(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may own kid profiles and set approvals.
    #[must_use]
    pub const fn can_manage_profiles(&self) -> bool {
        matches!(self, Self::Admin | Self::Parent)
    }

    /// The canonical lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Parent => "parent",
            Self::Kid => "kid",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "parent" => Ok(Self::Parent),
            "kid" => Ok(Self::Kid),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}
