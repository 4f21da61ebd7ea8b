//! # Money Module
//!
//! Provides the `Money` type for booking prices.
//!
//! ## Why Whole Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VND HAS NO SUBUNIT                                                     │
//! │                                                                         │
//! │  Fares, baggage tiers and service addons are all quoted in whole dong. │
//! │  Storing them as i64 keeps every sum exact.                             │
//! │                                                                         │
//! │  Rounding noise still shows up where prices were derived elsewhere     │
//! │  (search results, backend quotes), so equality is checked against a   │
//! │  tolerance of 1 unit rather than with ==.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fareguard_core::money::Money;
//!
//! let fare = Money::new(1_256_000);
//! let baggage = Money::new(260_000);
//! let total = fare + baggage;
//!
//! assert_eq!(total.amount(), 1_516_000);
//! assert_eq!(total.to_string(), "1,516,000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

/// Maximum absolute difference still treated as "equal".
pub const PRICE_TOLERANCE: Money = Money::new(1);

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in whole currency units.
///
/// Signed on purpose: upstream records are not schema-validated, and a
/// negative price has to survive long enough to be reported by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Returns the raw amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Negative amounts become zero, everything else is unchanged.
    ///
    /// ```rust
    /// use fareguard_core::money::Money;
    ///
    /// assert_eq!(Money::new(-500).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::new(500).clamp_non_negative(), Money::new(500));
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies a per-passenger price by a head count, saturating.
    #[inline]
    pub fn multiply_count(&self, count: usize) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Money(self.0.saturating_mul(count))
    }

    /// Absolute difference between two amounts, saturating at `i64::MAX`.
    #[inline]
    pub const fn abs_diff(&self, other: Money) -> Self {
        Money(self.0.saturating_sub(other.0).saturating_abs())
    }

    /// True when the two amounts differ by at most `tolerance`.
    ///
    /// ```rust
    /// use fareguard_core::money::{Money, PRICE_TOLERANCE};
    ///
    /// let a = Money::new(1_000_000);
    /// assert!(a.within_tolerance(Money::new(1_000_001), PRICE_TOLERANCE));
    /// assert!(!a.within_tolerance(Money::new(1_000_002), PRICE_TOLERANCE));
    /// ```
    #[inline]
    pub const fn within_tolerance(&self, other: Money, tolerance: Money) -> bool {
        self.abs_diff(other).0 <= tolerance.0
    }

    /// Expresses `self` as a percentage of `base`.
    ///
    /// A zero base yields 0 instead of dividing by zero.
    pub fn percentage_of(&self, base: Money) -> f64 {
        if base.0 == 0 {
            return 0.0;
        }
        (self.0 as f64 * 100.0) / base.0 as f64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates at the i64 bounds instead of overflowing.

/// Groups thousands with commas: `1256000` → `1,256,000`.
///
/// Currency symbols are left to the caller; the same amount is shown
/// as "₫" in the booking UI and as "VND" in bug reports.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if self.0 < 0 {
            grouped.push('-');
        }
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        f.write_str(&grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::new(0).to_string(), "0");
        assert_eq!(Money::new(999).to_string(), "999");
        assert_eq!(Money::new(1_000).to_string(), "1,000");
        assert_eq!(Money::new(1_256_000).to_string(), "1,256,000");
        assert_eq!(Money::new(-60_000).to_string(), "-60,000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(1_000);
        let b = Money::new(400);

        assert_eq!((a + b).amount(), 1_400);
        assert_eq!((a - b).amount(), 600);
        assert_eq!((a * 3).amount(), 3_000);
        assert_eq!(a.multiply_count(0), Money::zero());
    }

    #[test]
    fn test_sum() {
        let prices = vec![Money::new(150_000), Money::new(100_000)];
        let by_ref: Money = prices.iter().sum();
        let by_value: Money = prices.into_iter().sum();
        assert_eq!(by_ref, Money::new(250_000));
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_tolerance_boundary() {
        let a = Money::new(500_000);
        assert!(a.within_tolerance(Money::new(499_999), PRICE_TOLERANCE));
        assert!(a.within_tolerance(Money::new(500_001), PRICE_TOLERANCE));
        assert!(!a.within_tolerance(Money::new(500_002), PRICE_TOLERANCE));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::new(i64::MAX);
        let min = Money::new(i64::MIN);

        assert_eq!(max + Money::new(1), max);
        assert_eq!(min - Money::new(1), min);
        assert_eq!(max * 2, max);
        assert_eq!(max.multiply_count(usize::MAX), max);
        assert_eq!(min.abs(), max);
        assert_eq!(max.abs_diff(min), max);

        let mut total = max;
        total += Money::new(260_000);
        assert_eq!(total, max);
        assert_eq!(vec![max, max].iter().sum::<Money>(), max);
    }

    #[test]
    fn test_percentage_of() {
        let diff = Money::new(60_000);
        assert_eq!(diff.percentage_of(Money::new(1_000_000)), 6.0);
        assert_eq!(diff.percentage_of(Money::zero()), 0.0);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::new(260_000)).unwrap();
        assert_eq!(json, "260000");
        let back: Money = serde_json::from_str("260000").unwrap();
        assert_eq!(back, Money::new(260_000));
    }
}
