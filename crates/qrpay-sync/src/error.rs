//! # Sync Error Types
//!
//! Error types for remote operations and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │    Service      │  │  Malformed Response     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  ConnectionFail │  │  Service        │  │  MalformedResponse      │ │
//! │  │  Timeout        │  │  (non-2xx)      │  │  (bad JSON / no body)   │ │
//! │  │  (retryable)    │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  Configuration  │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  InvalidConfig  │  │  TaskFailed     │                              │
//! │  │  InvalidUrl     │  │                 │                              │
//! │  │  ConfigLoad/Save│  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! │                                                                         │
//! │  None of these ever reach the caller of add_product: the coordinator   │
//! │  turns every remote failure into a diagnostic.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible remote and configuration failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid service URL.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the service (DNS, refused, reset, ...).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    // =========================================================================
    // Service Errors
    // =========================================================================
    /// The service answered with a non-success status.
    #[error("Service error {status}: {body}")]
    Service { status: u16, body: String },

    /// The service answered 2xx but the body could not be used.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // =========================================================================
    // Ordering
    // =========================================================================
    /// A newer push was issued, so this older one was not (re)sent.
    #[error("Push #{seq} superseded by #{latest}")]
    Superseded { seq: u64, latest: u64 },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// A spawned remote task panicked or was cancelled.
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Coarse classification used in diagnostics and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    Transport,
    Service,
    MalformedResponse,
    Superseded,
    Config,
    Internal,
}

impl std::fmt::Display for SyncErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncErrorKind::Transport => write!(f, "transport"),
            SyncErrorKind::Service => write!(f, "service"),
            SyncErrorKind::MalformedResponse => write!(f, "malformed_response"),
            SyncErrorKind::Superseded => write!(f, "superseded"),
            SyncErrorKind::Config => write!(f, "config"),
            SyncErrorKind::Internal => write!(f, "internal"),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Service {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_decode() {
            SyncError::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            SyncError::InvalidConfig(err.to_string())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Maps the error onto its category.
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => SyncErrorKind::Transport,
            SyncError::Service { .. } => SyncErrorKind::Service,
            SyncError::MalformedResponse(_) => SyncErrorKind::MalformedResponse,
            SyncError::Superseded { .. } => SyncErrorKind::Superseded,
            SyncError::InvalidConfig(_)
            | SyncError::InvalidUrl(_)
            | SyncError::ConfigLoadFailed(_)
            | SyncError::ConfigSaveFailed(_) => SyncErrorKind::Config,
            SyncError::TaskFailed(_) => SyncErrorKind::Internal,
        }
    }

    /// Returns true if the request may succeed when simply sent again.
    ///
    /// Only transport failures qualify. A 500 from the service or an
    /// unparseable body is reported as-is; the next ledger change will
    /// trigger a fresh request anyway.
    pub fn is_retryable(&self) -> bool {
        self.kind() == SyncErrorKind::Transport
    }
}
