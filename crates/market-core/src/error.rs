//! # Error Types
//!
//! Domain-specific error types for market-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  market-core errors (this file)                                        │
//! │  ├── CoreError        - Settlement failures (state, stock, lookup)     │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  market-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── CommandError     - What the cashier sees                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CommandError → Console            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable: the failing operation is rejected and the
//! session keeps the state it had before the call.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Settlement engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product with this code in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// No customer registered under this phone number.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Not enough stock in the ledger to cover the request.
    ///
    /// ## User Workflow
    /// ```text
    /// add P001 x5
    ///      │
    ///      ▼
    /// ledger: P001 = 3
    ///      │
    ///      ▼
    /// InsufficientStock { code: "P001", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Console shows: "Insufficient stock for P001: available 3, requested 5"
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// The operation is not allowed in the session's current state.
    ///
    /// ## When This Occurs
    /// - Adding items before `start` or after `complete`/`cancel`
    /// - Starting a session that is already open
    /// - Replacing the customer after points were redeemed
    #[error("Cannot {operation} while session is {state}")]
    InvalidState { operation: String, state: String },

    /// The cashier already has an open session on another lane.
    #[error("Cashier {0} already has an open transaction")]
    CashierBusy(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error.
    pub fn invalid_state(operation: impl Into<String>, state: impl ToString) -> Self {
        CoreError::InvalidState {
            operation: operation.into(),
            state: state.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs, so nothing has been mutated when
/// one of these comes back.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone with letters, email without `@`).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
