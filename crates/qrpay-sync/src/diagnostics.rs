//! # Diagnostics
//!
//! Remote failures never surface to the person at the till; they are
//! reported here instead. The terminal prints them, tests collect them.

use std::sync::Arc;

use qrpay_core::Money;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SyncErrorKind;

/// Something worth telling an operator about a remote call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    PushSucceeded {
        seq: u64,
        total: Money,
    },
    PushFailed {
        seq: u64,
        total: Money,
        kind: SyncErrorKind,
        message: String,
    },
    /// A push gave up because a newer total was already being sent.
    PushSuperseded {
        seq: u64,
        latest: u64,
    },
    FetchFailed {
        seq: u64,
        total: Money,
        kind: SyncErrorKind,
        message: String,
    },
    /// A QR response arrived after a newer one was already on screen.
    StaleDiscarded {
        seq: u64,
        displayed_seq: u64,
    },
    Displayed {
        seq: u64,
        total: Money,
    },
    /// A remote task panicked or was aborted.
    TaskFailed {
        message: String,
    },
}

impl Diagnostic {
    /// True for the variants that describe a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Diagnostic::PushFailed { .. }
                | Diagnostic::FetchFailed { .. }
                | Diagnostic::TaskFailed { .. }
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::PushSucceeded { seq, total } => {
                write!(f, "#{} total {} sent", seq, total)
            }
            Diagnostic::PushFailed {
                seq,
                total,
                kind,
                message,
            } => write!(f, "#{} sending total {} failed ({}): {}", seq, total, kind, message),
            Diagnostic::PushSuperseded { seq, latest } => {
                write!(f, "#{} total not sent, #{} is newer", seq, latest)
            }
            Diagnostic::FetchFailed {
                seq,
                total,
                kind,
                message,
            } => write!(f, "#{} QR for {} failed ({}): {}", seq, total, kind, message),
            Diagnostic::StaleDiscarded { seq, displayed_seq } => write!(
                f,
                "#{} QR arrived after #{} was shown, discarded",
                seq, displayed_seq
            ),
            Diagnostic::Displayed { seq, total } => write!(f, "#{} QR for {} displayed", seq, total),
            Diagnostic::TaskFailed { message } => write!(f, "remote task failed: {}", message),
        }
    }
}

// =============================================================================
// Emitter Trait
// =============================================================================

/// Sink for [`Diagnostic`]s.
pub trait DiagnosticsEmitter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Discards everything.
pub struct NoOpEmitter;

impl DiagnosticsEmitter for NoOpEmitter {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Writes diagnostics to the tracing subscriber.
pub struct TracingEmitter;

impl DiagnosticsEmitter for TracingEmitter {
    fn report(&self, diagnostic: &Diagnostic) {
        if diagnostic.is_failure() {
            warn!(%diagnostic, "remote");
        } else if matches!(
            diagnostic,
            Diagnostic::PushSucceeded { .. } | Diagnostic::PushSuperseded { .. }
        ) {
            debug!(%diagnostic, "remote");
        } else {
            info!(%diagnostic, "remote");
        }
    }
}

/// Forwards diagnostics over an unbounded channel.
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<Diagnostic>,
}

impl ChannelEmitter {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Diagnostic>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelEmitter { tx }), rx)
    }
}

impl DiagnosticsEmitter for ChannelEmitter {
    fn report(&self, diagnostic: &Diagnostic) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(diagnostic.clone());
    }
}
