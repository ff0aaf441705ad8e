//! # Error Types
//!
//! Domain-specific error types for qrpay-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  qrpay-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger lookups                                 │
//! │  └── ValidationError  - Rejected user input (price text)               │
//! │                                                                         │
//! │  qrpay-sync errors (separate crate)                                    │
//! │  └── SyncError        - Transport / service / malformed / config       │
//! │                                                                         │
//! │  Ledger mutations themselves never fail: bad input is rejected         │
//! │  while building a `Price`, before the ledger is touched.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product at the requested ledger position.
    #[error("No product at position {index} (ledger has {len} products)")]
    ProductNotFound { index: usize, len: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur while turning user-typed text into domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (not a plain decimal number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Too many digits after the decimal point.
    #[error("{field} must have at most {max} decimal places")]
    TooPrecise { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
