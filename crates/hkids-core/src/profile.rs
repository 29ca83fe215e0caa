//! Kid profiles and parental category approvals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, KidProfileId, UserId};

/// A kid profile owned by exactly one parent user.
///
/// Deleting the parent cascades to their profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KidProfile {
    /// The profile ID.
    pub id: KidProfileId,

    /// The owning parent user.
    pub parent_id: UserId,

    /// Display name.
    pub name: String,

    /// Stored path of an avatar image, if set.
    pub avatar: Option<String>,

    /// The kid's age, if set. Used for age-range matching in listings.
    pub age: Option<i16>,

    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl KidProfile {
    /// Create a new profile for a parent.
    #[must_use]
    pub fn new(parent_id: UserId, name: String) -> Self {
        Self {
            id: KidProfileId::generate(),
            parent_id,
            name,
            avatar: None,
            age: None,
            created_at: Utc::now(),
        }
    }
}

/// A parent's approval decision for one (profile, category) pair.
///
/// The pair is unique; re-submitting it updates `approved` and `updated_at`
/// instead of duplicating the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentApproval {
    /// The kid profile the decision applies to.
    pub kid_profile_id: KidProfileId,

    /// The category being approved or denied.
    pub category_id: CategoryId,

    /// Whether the profile may see books in the category.
    pub approved: bool,

    /// When the decision was last changed.
    pub updated_at: DateTime<Utc>,
}
