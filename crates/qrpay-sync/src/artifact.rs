//! # QR Artifacts
//!
//! A fetched QR image is a scarce display resource: each one holds a slot
//! in the [`ArtifactRegistry`] until it is released. Release happens when
//! the [`ArtifactHandle`] is dropped, so an artifact cannot be released
//! twice or forgotten.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Artifact Lifecycle                                │
//! │                                                                         │
//! │   fetch_qr OK ──► registry.create() ──► QrArtifact { handle, image }   │
//! │   (a stale response is dropped before this point and never gets a     │
//! │    handle)                                                             │
//! │                                               │                         │
//! │            ┌──────────────────────────────────┴─────────────┐           │
//! │            ▼                                                ▼           │
//! │     replaced by a newer                                 teardown       │
//! │     displayed artifact                                                 │
//! │            │                                                │           │
//! │            └──────────────────► drop(handle) ◄──────────────┘           │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                       registry: live -1, released +1                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use qrpay_core::Money;
use serde::Serialize;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::remote::QrImage;

// =============================================================================
// Artifact Id
// =============================================================================

/// Identifier of one displayed QR artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    fn new() -> Self {
        ArtifactId(Uuid::new_v4())
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:qrpay/{}", self.0)
    }
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Default)]
struct RegistryInner {
    live: HashSet<ArtifactId>,
    created: u64,
    released: u64,
}

/// Tracks which artifacts are alive.
///
/// Cheap to clone; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new artifact and returns the handle that owns it.
    pub fn create(&self) -> ArtifactHandle {
        let id = ArtifactId::new();
        match self.inner.lock() {
            Ok(mut inner) => {
                inner.live.insert(id);
                inner.created += 1;
            }
            Err(_) => warn!(%id, "Artifact registry lock poisoned on create"),
        }
        trace!(%id, "Artifact created");

        ArtifactHandle {
            id,
            registry: self.clone(),
        }
    }

    fn revoke(&self, id: ArtifactId) {
        match self.inner.lock() {
            Ok(mut inner) => {
                if inner.live.remove(&id) {
                    inner.released += 1;
                    trace!(%id, "Artifact released");
                }
            }
            Err(_) => warn!(%id, "Artifact registry lock poisoned on release"),
        }
    }

    /// Number of artifacts created and not yet released.
    pub fn live_count(&self) -> usize {
        self.inner.lock().map(|i| i.live.len()).unwrap_or(0)
    }

    pub fn created_count(&self) -> u64 {
        self.inner.lock().map(|i| i.created).unwrap_or(0)
    }

    pub fn released_count(&self) -> u64 {
        self.inner.lock().map(|i| i.released).unwrap_or(0)
    }

    pub fn is_live(&self, id: ArtifactId) -> bool {
        self.inner
            .lock()
            .map(|i| i.live.contains(&id))
            .unwrap_or(false)
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Owning handle for one artifact. Dropping it releases the artifact.
#[derive(Debug)]
pub struct ArtifactHandle {
    id: ArtifactId,
    registry: ArtifactRegistry,
}

impl ArtifactHandle {
    pub fn id(&self) -> ArtifactId {
        self.id
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}

// =============================================================================
// QR Artifact
// =============================================================================

/// A QR image ready for display, tagged with the mutation it answers.
#[derive(Debug)]
pub struct QrArtifact {
    handle: ArtifactHandle,
    pub image: QrImage,
    pub total: Money,
    pub seq: u64,
    pub fetched_at: DateTime<Utc>,
}

impl QrArtifact {
    pub fn new(registry: &ArtifactRegistry, image: QrImage, total: Money, seq: u64) -> Self {
        QrArtifact {
            handle: registry.create(),
            image,
            total,
            seq,
            fetched_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ArtifactId {
        self.handle.id()
    }
}
