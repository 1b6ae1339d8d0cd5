//! Common error types for VMS

use crate::validation::ValidationError;
use thiserror::Error;

/// Common result type for VMS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the voucher service
#[derive(Error, Debug)]
pub enum Error {
    /// Candidate field failed a business rule
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// An active voucher already uses this code
    #[error("voucher code '{0}' already exists")]
    DuplicateCode(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upload body could not be parsed at all
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// CSV upload carried no data rows
    #[error("CSV file is empty or has no data rows")]
    EmptyImport,

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
