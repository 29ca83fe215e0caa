//! Book categories.

use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;

/// Default categories seeded at schema initialization, insert-or-do-nothing.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Adventure", "Journeys, quests, and daring explorers"),
    ("Fairy Tales", "Classic and modern tales of wonder"),
    ("Animals", "Stories about animals big and small"),
    ("Science", "First steps into how the world works"),
];

/// A book category. Static reference data with a unique name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// The category ID.
    pub id: CategoryId,

    /// Unique display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,
}

impl Category {
    /// Create a new category.
    #[must_use]
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: CategoryId::generate(),
            name,
            description,
        }
    }
}
