//! Error types for HKids domain operations.

use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors that can occur in domain operations.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// An age range where min exceeds max.
    #[error("invalid age range: min={min} exceeds max={max}")]
    InvalidAgeRange {
        /// Lower bound supplied by the caller.
        min: i16,
        /// Upper bound supplied by the caller.
        max: i16,
    },

    /// A role string outside the closed enumeration.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// An identifier that failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
