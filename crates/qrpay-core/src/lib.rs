//! # qrpay-core: Pure Business Logic for QR Pay
//!
//! This crate holds the product ledger and the money types behind it. Every
//! function is deterministic and free of I/O; the network side lives in
//! `qrpay-sync`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        QR Pay Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Terminal front end                           │   │
//! │  │        name / price input ──► add ──► list / total / QR         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PosSession                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ qrpay-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Ledger   │  │ parse     │  │   │
//! │  │   │  Price    │  │  wire fmt │  │  Event    │  │ price     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ LedgerEvent                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             qrpay-sync (EffectCoordinator, RemoteSync)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Price, Product, ProductDraft)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - The append-only product ledger and its mutation events
//! - [`error`] - Domain error types
//! - [`validation`] - Parsing and validation of user-entered prices
//!
//! ## Example Usage
//!
//! ```rust
//! use qrpay_core::{Ledger, Price};
//!
//! let mut ledger = Ledger::new();
//! let event = ledger.add_product("Pen", Price::parse("10").unwrap());
//!
//! assert_eq!(event.seq, 1);
//! assert!(event.total_changed());
//! assert_eq!(ledger.total().cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{Ledger, LedgerEvent};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest price accepted for a single product, in minor units.
///
/// Keeps the incrementally maintained total far away from `i64` overflow.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Maximum number of fractional digits accepted when parsing a price.
pub const MAX_PRICE_DECIMALS: usize = 2;
