//! # Ledger
//!
//! The append-only list of products entered this session, plus the running
//! total and the pending input fields.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger Mutation Flow                             │
//! │                                                                         │
//! │  set_draft_name("Pen") ─┐                                              │
//! │  set_draft_price(10)  ──┴──► draft { name, price }                     │
//! │                                   │                                     │
//! │                              submit_draft()                             │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  add_product(name, price) ──► products.push(product)                   │
//! │                               total += price (saturating)              │
//! │                               draft cleared                            │
//! │                               seq += 1                                 │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                         LedgerEvent { seq, total, ... }                │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                     EffectCoordinator::on_ledger_event                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `total == products.iter().map(price).sum()` after every mutation
//! - `seq` equals the number of completed `add_product` calls
//! - The total saturates at `i64::MAX` cents instead of overflowing
//! - Products are never removed or edited

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Price, Product, ProductDraft};

// =============================================================================
// Ledger Event
// =============================================================================

/// Record of one completed `add_product` call.
///
/// Subscribers use it instead of watching the total for changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Mutation number, starting at 1 and strictly increasing per session.
    pub seq: u64,

    /// Position of the new product in the ledger.
    pub index: usize,

    /// The product that was appended.
    pub product: Product,

    /// Total before the mutation.
    pub previous_total: Money,

    /// Total after the mutation.
    pub total: Money,
}

impl LedgerEvent {
    /// True when the mutation moved the total (i.e. the price was non-zero).
    #[inline]
    pub fn total_changed(&self) -> bool {
        self.previous_total != self.total
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// In-memory record of added products and their running total.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ledger {
    products: Vec<Product>,
    total: Money,
    draft: ProductDraft,
    seq: u64,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a product and returns the mutation event.
    ///
    /// Never fails: `price` was validated when the [`Price`] was built, and
    /// any name is accepted, including an empty one. The pending draft is
    /// cleared whether or not it was the source of this product.
    ///
    /// ## Example
    /// ```rust
    /// use qrpay_core::{Ledger, Price};
    ///
    /// let mut ledger = Ledger::new();
    /// ledger.add_product("Pen", Price::from_major(10));
    /// let event = ledger.add_product("Book", Price::zero());
    ///
    /// assert_eq!(ledger.len(), 2);
    /// assert_eq!(ledger.total().cents(), 1000);
    /// assert!(!event.total_changed());
    /// ```
    pub fn add_product(&mut self, name: impl Into<String>, price: Price) -> LedgerEvent {
        let product = Product::new(name, price);
        let previous_total = self.total;

        self.products.push(product.clone());
        self.total = self.total.saturating_add(price.money());
        self.draft = ProductDraft::default();
        self.seq += 1;

        LedgerEvent {
            seq: self.seq,
            index: self.products.len() - 1,
            product,
            previous_total,
            total: self.total,
        }
    }

    /// Adds whatever is currently in the draft fields.
    pub fn submit_draft(&mut self) -> LedgerEvent {
        let draft = self.draft.take();
        self.add_product(draft.name, draft.price)
    }

    // =========================================================================
    // Draft (pending input)
    // =========================================================================

    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_draft_price(&mut self, price: Price) {
        self.draft.price = price;
    }

    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    /// Products in insertion order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Product at a ledger position.
    pub fn product(&self, index: usize) -> CoreResult<&Product> {
        self.products.get(index).ok_or(CoreError::ProductNotFound {
            index,
            len: self.products.len(),
        })
    }

    /// The incrementally maintained running total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Sum of all prices, computed from scratch.
    ///
    /// Always equal to [`Ledger::total`]; exposed for consistency checks.
    pub fn recomputed_total(&self) -> Money {
        self.products.iter().map(|p| p.price.money()).sum()
    }

    /// Number of completed mutations.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
