//! Core error types for the Ledgerbook application.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::fx::FxError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Returns true when the error is caused by user input the user can fix.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::ConstraintViolation(_)
        )
    }

    /// Per-entry annotations, when the error came from validating entry drafts.
    pub fn entry_issues(&self) -> &[EntryIssue] {
        match self {
            Error::Validation(ValidationError::Entries(issues)) => issues,
            _ => &[],
        }
    }
}

/// Database-agnostic error type for storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

/// Errors raised while keeping stored balances and totals in step with entries.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account {0} not found")]
    AccountNotFound(String),

    #[error("Transaction {0} not found")]
    TransactionNotFound(String),

    #[error("Entry {0} not found")]
    EntryNotFound(String),

    #[error("Category {0} not found")]
    CategoryNotFound(String),

    #[error("Stored amount '{value}' on {record} is not a valid decimal")]
    CorruptAmount { record: String, value: String },
}

/// One problem found on one entry draft of a transaction form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryIssue {
    /// Position of the entry in the submitted list.
    pub index: usize,
    /// Field the problem is attached to (`account`, `currency`, `amount`).
    pub field: String,
    pub message: String,
}

impl EntryIssue {
    pub fn new(index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            index,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry {} {}: {}", self.index + 1, self.field, self.message)
    }
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    #[error("{}", describe_entry_issues(.0))]
    Entries(Vec<EntryIssue>),
}

fn describe_entry_issues(issues: &[EntryIssue]) -> String {
    let noun = if issues.len() == 1 { "entry needs" } else { "entries need" };
    let details = issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} {} attention: {}", issues.len(), noun, details)
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
