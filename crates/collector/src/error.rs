//! Error types for the collector.

use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors that can occur while submitting or dispatching transactions.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The transaction store failed.
    #[error("store error: {0}")]
    Database(#[from] DatabaseError),

    /// The submission was rejected before reaching the store.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;
