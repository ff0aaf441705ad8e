//! # qrpay-sync: Remote Effects for QR Pay
//!
//! Everything that leaves the process lives here: the HTTP client for the
//! QR / total service, the coordinator that decides which QR is shown, and
//! the session container the front end drives.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Effect Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    PosSession (owned by the front end)           │  │
//! │  │                                                                  │  │
//! │  │   Ledger::add_product ──► LedgerEvent ──► on_ledger_event        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ push_total     │  │  fetch_qr      │  │  ArtifactRegistry      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ fire and       │  │ tagged with    │  │ one live QR artifact,  │    │
//! │  │ forget, result │  │ ledger seq,    │  │ released on replace    │    │
//! │  │ is diagnostic  │  │ stale dropped  │  │ or teardown            │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  DIAGNOSTICS (DiagnosticsEmitter):                                     │
//! │  • push succeeded / failed / superseded by a newer push                │
//! │  • fetch failed, stale response discarded, QR displayed               │
//! │  • remote task failed                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`artifact`] - Displayed QR artifacts and their release registry
//! - [`config`] - Client configuration (service URL, retries, ordering)
//! - [`coordinator`] - `EffectCoordinator` state machine
//! - [`diagnostics`] - Diagnostic events and emitters
//! - [`error`] - Sync error types
//! - [`remote`] - `RemoteSync` trait and the HTTP implementation
//! - [`session`] - `PosSession` container

// =============================================================================
// Module Declarations
// =============================================================================

pub mod artifact;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod remote;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use artifact::{ArtifactHandle, ArtifactId, ArtifactRegistry, QrArtifact};
pub use config::{ClientConfig, Environment, OrderingPolicy};
pub use coordinator::{
    Completion, CoordinatorStatus, DisplayState, EffectCoordinator, PushReport, Transition,
};
pub use diagnostics::{ChannelEmitter, Diagnostic, DiagnosticsEmitter, NoOpEmitter, TracingEmitter};
pub use error::{SyncError, SyncErrorKind, SyncResult};
pub use remote::{Ack, HttpRemote, PushSequencer, PushTicket, QrImage, RemoteSync};
pub use session::PosSession;
