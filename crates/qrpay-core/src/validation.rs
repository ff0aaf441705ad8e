//! # Validation Module
//!
//! Turns user-typed price text into validated money values.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal input                                               │
//! │  └── Splits the line into name / price text                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── parse_amount: plain decimal, max 2 fractional digits              │
//! │  └── validate_price_cents: 0 ≤ price ≤ MAX_PRICE_CENTS                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Price type                                                   │
//! │  └── Only constructible through these checks, so Ledger::add_product   │
//! │      never has to fail                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use qrpay_core::validation::{parse_amount, validate_price_cents};
//!
//! let money = parse_amount("price", "10.5").unwrap();
//! assert_eq!(money.cents(), 1050);
//! assert!(validate_price_cents(money.cents()).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_PRICE_CENTS, MAX_PRICE_DECIMALS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Parsing
// =============================================================================

/// Parses a decimal amount such as `"10"`, `"10.5"`, `".75"` or `"-3"`.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Optional leading sign, digits, optional `.` with up to 2 digits
/// - No exponents, no `NaN` / `inf`, no thousands separators
///
/// Sign is preserved here; range checks belong to [`validate_price_cents`].
pub fn parse_amount(field: &str, text: &str) -> ValidationResult<Money> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let (negative, unsigned) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid_format(field, "must contain at least one digit"));
    }

    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid_format(field, "must be a plain decimal number"));
    }

    if fraction.len() > MAX_PRICE_DECIMALS {
        return Err(ValidationError::TooPrecise {
            field: field.to_string(),
            max: MAX_PRICE_DECIMALS,
        });
    }

    // Anything longer than this is out of range anyway; bail before i64 overflow
    let whole = whole.trim_start_matches('0');
    if whole.len() > 15 {
        return Err(out_of_range(field));
    }

    let major: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| out_of_range(field))?
    };

    let minor: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| out_of_range(field))? * 10,
        _ => fraction.parse().map_err(|_| out_of_range(field))?,
    };

    let cents = major * 100 + minor;
    Ok(Money::from_cents(if negative { -cents } else { cents }))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in minor units.
///
/// ## Rules
/// - Must be non-negative (zero is allowed: free items)
/// - Must not exceed [`MAX_PRICE_CENTS`]
///
/// ## Example
/// ```rust
/// use qrpay_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(out_of_range("price"));
    }

    Ok(())
}

fn invalid_format(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_PRICE_CENTS,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
