//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A cash count is a long chain of additions and subtractions.            │
//! │  Accumulated float drift shows up as phantom "differences" in the      │
//! │  drawer - the one place where exact equality is the whole point.       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    $1.500,50 is stored as 150050 centavos (i64)                        │
//! │    Sums and differences are exact; equality checks are exact.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mostrador_core::money::Money;
//!
//! // Create from centavos (preferred)
//! let total = Money::from_centavos(150050); // $1500.50
//!
//! // Arithmetic operations
//! let double = total + total;
//! let nothing = total - total;
//! assert!(nothing.is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in centavos (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: drawer differences are legitimately negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type: product
/// prices, sale totals, expenses, opening floats, counted amounts and the
/// resulting differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// let price = Money::from_centavos(99900); // $999.00
    /// assert_eq!(price.centavos(), 99900);
    /// ```
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Creates a Money value from whole pesos.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// let float = Money::from_pesos(500); // $500.00
    /// assert_eq!(float.centavos(), 50000);
    /// ```
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos * 100)
    }

    /// Returns the value in centavos (smallest currency unit).
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// assert_eq!(Money::from_centavos(150050).pesos(), 1500);
    /// assert_eq!(Money::from_centavos(-550).pesos(), -5);
    /// ```
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// let unit_price = Money::from_centavos(89900); // $899.00 per kg
    /// assert_eq!(unit_price.multiply_quantity(3).centavos(), 269700);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a user-entered amount string.
    ///
    /// Accepts plain numbers with an optional `$` prefix, optional thousands
    /// separators, and up to two decimals with `.` or `,` as the decimal
    /// mark. Returns `None` for anything else - callers at the input
    /// boundary decide whether `None` means "error" or "treat as zero".
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::money::Money;
    ///
    /// assert_eq!(Money::parse("1500,50"), Some(Money::from_centavos(150050)));
    /// assert_eq!(Money::parse("$ 1.500,50"), Some(Money::from_centavos(150050)));
    /// assert_eq!(Money::parse("1500.5"), Some(Money::from_centavos(150050)));
    /// assert_eq!(Money::parse("abc"), None);
    /// assert_eq!(Money::parse(""), None);
    /// ```
    pub fn parse(input: &str) -> Option<Money> {
        let raw = input.trim().trim_start_matches('$').trim();
        if raw.is_empty() {
            return None;
        }

        let (raw, negative) = match raw.strip_prefix('-') {
            Some(rest) => (rest.trim(), true),
            None => (raw, false),
        };

        // The last '.' or ',' is the decimal mark when it is followed by
        // one or two digits; every other '.'/',' is a thousands separator.
        let decimal_pos = raw
            .rfind(['.', ','])
            .filter(|&pos| (1..=2).contains(&(raw.len() - pos - 1)));

        let (whole_part, decimal_part) = match decimal_pos {
            Some(pos) => (&raw[..pos], &raw[pos + 1..]),
            None => (raw, ""),
        };

        let mut pesos: i64 = 0;
        let mut saw_digit = false;
        for c in whole_part.chars() {
            match c {
                '0'..='9' => {
                    saw_digit = true;
                    pesos = pesos.checked_mul(10)?.checked_add(c as i64 - '0' as i64)?;
                }
                '.' | ',' => {} // thousands separator
                _ => return None,
            }
        }
        if !saw_digit && decimal_part.is_empty() {
            return None;
        }

        let mut centavos: i64 = 0;
        for c in decimal_part.chars() {
            if !c.is_ascii_digit() {
                return None;
            }
            centavos = centavos * 10 + (c as i64 - '0' as i64);
        }
        if decimal_part.len() == 1 {
            centavos *= 10;
        }

        let total = pesos.checked_mul(100)?.checked_add(centavos)?;
        Some(Money(if negative { -total } else { total }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for messages and debugging. Use frontend formatting for actual
/// UI display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.pesos().abs(), self.centavos_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation (for turning an expected amount into an opening deficit).
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing an iterator of Money values.
///
/// Reconciliation is dominated by `Σ amounts` over small collections; a
/// `Sum` impl keeps that code as plain iterator chains.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_centavos() {
        let money = Money::from_centavos(150050);
        assert_eq!(money.centavos(), 150050);
        assert_eq!(money.pesos(), 1500);
        assert_eq!(money.centavos_part(), 50);
    }

    #[test]
    fn test_from_pesos() {
        assert_eq!(Money::from_pesos(500).centavos(), 50000);
        assert_eq!(Money::from_pesos(-5).centavos(), -500);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_centavos(150050)), "$1500.50");
        assert_eq!(format!("{}", Money::from_centavos(50000)), "$500.00");
        assert_eq!(format!("{}", Money::from_centavos(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_centavos(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_centavos(1000);
        let b = Money::from_centavos(500);

        assert_eq!((a + b).centavos(), 1500);
        assert_eq!((a - b).centavos(), 500);
        assert_eq!((b - a).centavos(), -500);
        assert_eq!((a * 3).centavos(), 3000);
        assert_eq!((-a).centavos(), -1000);
    }

    #[test]
    fn test_sum() {
        let amounts = [100, 250, 650].map(Money::from_centavos);
        let total: Money = amounts.into_iter().sum();
        assert_eq!(total.centavos(), 1000);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_centavos(100);
        assert!(positive.is_positive());

        let negative = Money::from_centavos(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().centavos(), 100);
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(Money::parse("1500"), Some(Money::from_centavos(150000)));
        assert_eq!(Money::parse("0"), Some(Money::zero()));
        assert_eq!(Money::parse("  250  "), Some(Money::from_centavos(25000)));
    }

    #[test]
    fn test_parse_decimals() {
        assert_eq!(Money::parse("1500.50"), Some(Money::from_centavos(150050)));
        assert_eq!(Money::parse("1500,50"), Some(Money::from_centavos(150050)));
        assert_eq!(Money::parse("1500.5"), Some(Money::from_centavos(150050)));
        assert_eq!(Money::parse(",50"), Some(Money::from_centavos(50)));
    }

    #[test]
    fn test_parse_formatted() {
        assert_eq!(Money::parse("$1.500,50"), Some(Money::from_centavos(150050)));
        assert_eq!(Money::parse("$ 12.000"), Some(Money::from_centavos(1200000)));
        // "1.500" reads as one thousand five hundred, not 1.50: three digits
        // after the mark make it a thousands separator
        assert_eq!(Money::parse("1.500"), Some(Money::from_centavos(150000)));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Money::parse("-50"), Some(Money::from_centavos(-5000)));
        assert_eq!(Money::parse("-0,50"), Some(Money::from_centavos(-50)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Money::parse(""), None);
        assert_eq!(Money::parse("   "), None);
        assert_eq!(Money::parse("abc"), None);
        assert_eq!(Money::parse("12a"), None);
        assert_eq!(Money::parse("$"), None);
        assert_eq!(Money::parse("--5"), None);
    }
}
