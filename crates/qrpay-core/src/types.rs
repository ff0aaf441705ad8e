//! # Domain Types
//!
//! Core domain types used throughout QR Pay.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Price       │   │    Product      │   │  ProductDraft   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Money >= 0     │   │  name           │   │  name (typed)   │       │
//! │  │  ≤ MAX_PRICE    │   │  price          │   │  price (typed)  │       │
//! │  │                 │   │  added_at       │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Product identity is positional: its index in the Ledger.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::validation::{parse_amount, validate_price_cents, ValidationResult};

// =============================================================================
// Price
// =============================================================================

/// A non-negative, bounded amount that can be put on a product.
///
/// The inner value is private: every constructor runs
/// [`validate_price_cents`], so holding a `Price` proves the amount is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Price(Money);

impl Price {
    /// The free price.
    #[inline]
    pub const fn zero() -> Self {
        Price(Money::zero())
    }

    /// Creates a price from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use qrpay_core::Price;
    ///
    /// assert_eq!(Price::from_cents(1050).unwrap().cents(), 1050);
    /// assert!(Price::from_cents(-1).is_err());
    /// ```
    pub fn from_cents(cents: i64) -> ValidationResult<Self> {
        validate_price_cents(cents)?;
        Ok(Price(Money::from_cents(cents)))
    }

    /// Creates a price from a whole number of major units.
    pub fn from_major(units: u32) -> Self {
        Price(Money::from_cents(units as i64 * 100))
    }

    /// Parses user-typed text such as `"10"` or `"10.50"`.
    ///
    /// ## Example
    /// ```rust
    /// use qrpay_core::Price;
    ///
    /// assert_eq!(Price::parse("7.5").unwrap().cents(), 750);
    /// assert!(Price::parse("-1").is_err());
    /// assert!(Price::parse("abc").is_err());
    /// ```
    pub fn parse(text: &str) -> ValidationResult<Self> {
        let money = parse_amount("price", text)?;
        Self::from_cents(money.cents())
    }

    #[inline]
    pub const fn money(&self) -> Money {
        self.0
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0.cents()
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Price> for Money {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl TryFrom<Money> for Price {
    type Error = crate::error::ValidationError;

    fn try_from(money: Money) -> Result<Self, Self::Error> {
        Price::from_cents(money.cents())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let money = Money::deserialize(deserializer)?;
        Price::try_from(money).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product entered by the cashier.
///
/// Immutable once added to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Display name, exactly as typed (may be empty).
    pub name: String,

    /// Unit price.
    pub price: Price,

    /// When the product was added to the ledger.
    pub added_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product stamped with the current time.
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Product {
            name: name.into(),
            price,
            added_at: Utc::now(),
        }
    }
}

// =============================================================================
// Product Draft
// =============================================================================

/// The pending input fields: what the cashier has typed but not yet added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: Price,
}

impl ProductDraft {
    /// Returns the draft contents and resets the fields to empty / zero.
    pub fn take(&mut self) -> ProductDraft {
        std::mem::take(self)
    }

    /// True when nothing has been typed yet.
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.price.is_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
