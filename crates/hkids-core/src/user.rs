//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{KidProfileId, UserId};
use crate::role::Role;

/// A user account.
///
/// The password hash never leaves the backend; response DTOs are built from
/// the other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID.
    pub id: UserId,

    /// Unique login name.
    pub username: String,

    /// Argon2 hash of the password.
    pub password_hash: String,

    /// Account role. Immutable after creation.
    pub role: Role,

    /// The kid profile bound to a kid account, if any.
    pub kid_profile_id: Option<KidProfileId>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new account with an already-hashed password.
    #[must_use]
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        Self {
            id: UserId::generate(),
            username,
            password_hash,
            role,
            kid_profile_id: None,
            created_at: Utc::now(),
        }
    }
}
