//! Fixed-point price utilities.
//!
//! Prices and price deltas are `i64` scaled by 10^8, so 150.25 is stored as
//! `15_025_000_000`. Keys in the price index must be totally ordered, which
//! rules out floats; deltas are signed, so the representation is too.
//!
//! ```
//! use stockbook::types::price::{from_fixed, to_fixed};
//!
//! let price = to_fixed("150.25").unwrap();
//! assert_eq!(price, 15_025_000_000);
//! assert_eq!(from_fixed(price), "150.25000000");
//!
//! let delta = to_fixed("-0.75").unwrap();
//! assert_eq!(delta, -75_000_000);
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Scaling factor for fixed-point values: 10^8
pub const SCALE: i64 = 100_000_000;

/// Largest whole-unit magnitude that fits: i64::MAX / SCALE (about 92 billion)
pub const MAX_VALUE: i64 = i64::MAX / SCALE;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Parse a decimal string into a fixed-point value.
///
/// Digits beyond the eighth decimal place are rounded. `None` when the string
/// is not a number or the value does not fit.
///
/// ```
/// use stockbook::types::price::to_fixed;
///
/// assert_eq!(to_fixed("1"), Some(100_000_000));
/// assert_eq!(to_fixed("0.00000001"), Some(1));
/// assert_eq!(to_fixed("-20"), Some(-2_000_000_000));
/// assert_eq!(to_fixed("n/a"), None);
/// ```
pub fn to_fixed(s: &str) -> Option<i64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_fixed(decimal)
}

/// Convert a `Decimal` to fixed-point, `None` if out of range
pub fn decimal_to_fixed(d: Decimal) -> Option<i64> {
    let scaled = d.checked_mul(Decimal::from(SCALE))?;
    scaled.round_dp(0).to_i64()
}

pub fn fixed_to_decimal(value: i64) -> Decimal {
    Decimal::from(value) / Decimal::from(SCALE)
}

/// Format with exactly 8 decimal places
pub fn from_fixed(value: i64) -> String {
    format!("{:.8}", fixed_to_decimal(value))
}

/// Format without trailing zeros
///
/// ```
/// use stockbook::types::price::from_fixed_trimmed;
///
/// assert_eq!(from_fixed_trimmed(10_000_000_000), "100");
/// assert_eq!(from_fixed_trimmed(-150_000_000), "-1.5");
/// ```
pub fn from_fixed_trimmed(value: i64) -> String {
    fixed_to_decimal(value).normalize().to_string()
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Apply a signed delta to a price, `None` on overflow
#[inline]
pub fn checked_add(price: i64, delta: i64) -> Option<i64> {
    price.checked_add(delta)
}

/// Reverse a previously applied delta, `None` on overflow
#[inline]
pub fn checked_sub(price: i64, delta: i64) -> Option<i64> {
    price.checked_sub(delta)
}

// ============================================================================
// Unit Tests
// ============================================================================
