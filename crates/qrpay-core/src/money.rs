//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A running total kept as a float drifts:                                │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  The ledger adds prices one by one for the whole session, so drift     │
//! │  would accumulate and the QR code would encode the wrong amount.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                     │
//! │    "10.50" → 1050, "0.1" + "0.2" → 10 + 20 = 30                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use qrpay_core::money::Money;
//!
//! let price = Money::from_cents(1050);
//! let total = price + Money::from_cents(700);
//!
//! assert_eq!(total.cents(), 1750);
//! assert_eq!(total.to_string(), "17.50");
//! assert_eq!(total.to_wire_string(), "17.5");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  "10.50" typed ──► Price ──► Product.price ──► Ledger.total            │
/// │                                                    │                    │
/// │                        ┌───────────────────────────┼─────────────┐      │
/// │                        ▼                           ▼             ▼      │
/// │               ?totalAmount=10.5       {"totalAmount":10.5}   ₹10.50     │
/// │                (fetch_qr)               (push_total)        (display)   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use qrpay_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds, clamping at the `i64` bounds instead of overflowing.
    #[inline]
    pub const fn saturating_add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    /// Renders the amount the way a JavaScript number prints it.
    ///
    /// The QR service was written against a browser client that sent plain
    /// JS numbers, so whole amounts carry no fraction and trailing zeros
    /// are dropped.
    ///
    /// ## Example
    /// ```rust
    /// use qrpay_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).to_wire_string(), "10");
    /// assert_eq!(Money::from_cents(1050).to_wire_string(), "10.5");
    /// assert_eq!(Money::from_cents(1234).to_wire_string(), "12.34");
    /// assert_eq!(Money::from_cents(5).to_wire_string(), "0.05");
    /// ```
    pub fn to_wire_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let major = self.major().abs();
        let minor = self.minor();

        match minor {
            0 => format!("{}{}", sign, major),
            m if m % 10 == 0 => format!("{}{}.{}", sign, major, m / 10),
            m => format!("{}{}.{:02}", sign, major, m),
        }
    }

    /// Formats the amount with a currency symbol and two decimals.
    ///
    /// ## Example
    /// ```rust
    /// use qrpay_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1050).format_with_symbol("₹"), "₹10.50");
    /// assert_eq!(Money::from_cents(-550).format_with_symbol("$"), "-$5.50");
    /// ```
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering without a currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol(""))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Money::saturating_add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_wire_string_matches_js_numbers() {
        assert_eq!(Money::zero().to_wire_string(), "0");
        assert_eq!(Money::from_cents(1200).to_wire_string(), "12");
        assert_eq!(Money::from_cents(1210).to_wire_string(), "12.1");
        assert_eq!(Money::from_cents(1201).to_wire_string(), "12.01");
        assert_eq!(Money::from_cents(99).to_wire_string(), "0.99");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);

        let total: Money = [a, b, Money::from_cents(1)].into_iter().sum();
        assert_eq!(total.cents(), 1501);
    }

    #[test]
    fn test_saturating_add_clamps() {
        let near_max = Money::from_cents(i64::MAX - 5);
        assert_eq!(near_max.saturating_add(Money::from_cents(5)).cents(), i64::MAX);
        assert_eq!(near_max.saturating_add(Money::from_cents(100)).cents(), i64::MAX);

        let total: Money = [near_max, Money::from_cents(100)].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    /// 0.1 + 0.2 is exactly 0.3 once prices are integers.
    #[test]
    fn test_no_float_drift() {
        let total = Money::from_cents(10) + Money::from_cents(20);
        assert_eq!(total, Money::from_cents(30));
        assert_eq!(total.to_wire_string(), "0.3");
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
