//! # Command Error Type
//!
//! Unified error type for console commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  cashier types: add P001 5                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command::parse ── bad syntax? ── CommandError::usage ──────────┐│  │
//! │  │         │                                                       ││  │
//! │  │         ▼                                                       ││  │
//! │  │  Console::execute                                               ││  │
//! │  │         │                                                       ││  │
//! │  │  CoreError::InsufficientStock ─── CommandError ────────────────►││  │
//! │  │  DbError::QueryFailed ─────────── CommandError ────────────────►││  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  console prints: [INSUFFICIENT_STOCK] Insufficient stock for P001: ...  │
//! │  and reads the next command                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use market_core::{CoreError, ValidationError};
use market_db::DbError;
use serde::Serialize;

/// Error shown to the cashier when a command fails.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct CommandError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes printed in brackets before the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown product or customer
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Ledger can't cover the request
    InsufficientStock,

    /// Operation not allowed in the session's state
    InvalidState,

    /// Cashier already serving on another lane
    CashierBusy,

    /// Unknown command or bad arguments
    InvalidCommand,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::CashierBusy => "CASHIER_BUSY",
            ErrorCode::InvalidCommand => "INVALID_COMMAND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CommandError {
            code,
            message: message.into(),
        }
    }

    /// Creates an error for malformed input, with the expected syntax.
    pub fn usage(usage: &str) -> Self {
        CommandError::new(ErrorCode::InvalidCommand, format!("usage: {}", usage))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::Internal, message)
    }
}

/// Converts settlement errors to command errors.
impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::ProductNotFound(_) | CoreError::CustomerNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidState { .. } => ErrorCode::InvalidState,
            CoreError::CashierBusy(_) => ErrorCode::CashierBusy,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        CommandError::new(code, message)
    }
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        CommandError::new(ErrorCode::ValidationError, err.to_string())
    }
}

/// Converts database errors to command errors.
impl From<DbError> for CommandError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                CommandError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, value } => CommandError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConnectionFailed(_) => {
                CommandError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                CommandError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                CommandError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => {
                // Log the actual error but show a generic message
                tracing::error!(error = %other, "Database operation failed");
                CommandError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
