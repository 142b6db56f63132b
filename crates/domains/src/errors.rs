//! # AppError
//!
//! Centralized error handling for the blog core.
//! Maps aggregate and store failures to the four caller-visible kinds.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Targeted entity absent (e.g., Post, Comment, Vote)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// The voter already has a vote on this post. Not retried.
    #[error("duplicate vote: {0} has already voted on this post")]
    DuplicateVote(String),

    /// Validation failure (e.g., empty title, empty comment)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A store call failed. The whole save/delete sequence may be retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }

    pub fn store(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{err:#}"))
    }

    /// Stable machine-readable code for adapters that render errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(..) => "NOT_FOUND",
            Self::DuplicateVote(_) => "DUPLICATE_VOTE",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Only transient store failures are safe to retry; primary writes are
    /// idempotent by id and index upserts by back-reference.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// A specialized Result type for blog core logic.
pub type Result<T> = std::result::Result<T, AppError>;
