//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a month of receipts as floats:                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ drift across aggregation         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    "90.00" × 3 = 9000 × 3 = 27000 cents = 270.00 exactly                │
//! │    Tax 10%     = (27000 × 1000 + 5000) / 10000 = 2700 cents             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billing_core::money::Money;
//!
//! let price: Money = "12.50".parse().unwrap();
//! assert_eq!(price.cents(), 1250);
//! assert_eq!((price * 3).to_string(), "37.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences in the price-variance table can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **sqlx transparent**: stored as a plain INTEGER column
///
/// ## Where Money Flows
/// ```text
/// Product.unit_price ──► ReceiptItem.std_price ──► total_std_price
///                                                        │
/// vendor price ────────► ReceiptItem.vendor_price ─► total_vend_price
///                                                        │
///                               Σ vend ──► tax ──► gross_amount
///                                                        │
///                              dashboard revenue ◄───────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use billing_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax, rounded half away from zero to the cent.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(amount × bps ± 5000) / 10000`.
    /// The ±5000 is half of the divisor, so `x.5` cents round outward.
    ///
    /// ## Example
    /// ```rust
    /// use billing_core::money::Money;
    /// use billing_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(1005); // 10.05
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1000));
    /// // 1.005 → 1.01
    /// assert_eq!(tax.cents(), 101);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large monthly totals from overflowing
        Money(div_round(self.0 as i128 * rate.bps() as i128, 10_000) as i64)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use billing_core::money::Money;
    ///
    /// let line = Money::from_cents(9000).multiply_quantity(3);
    /// assert_eq!(line.cents(), 27000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `multiply_quantity` that returns None on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Addition that returns None on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Mean of `total` over `count` entries, rounded half away from zero.
    ///
    /// Returns zero when `count` is zero.
    pub fn mean(total: Money, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money(div_round(total.0 as i128, count as i128) as i64)
    }

    /// Value in major units as a float, for spreadsheet cells and ratios only.
    ///
    /// Never feed the result back into money arithmetic.
    #[inline]
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Formats with a currency symbol prefix, e.g. `₿270.00`.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor_part())
    }
}

/// Integer division rounding half away from zero.
pub(crate) fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if (numerator < 0) != (denominator < 0) {
        (numerator - half) / denominator
    } else {
        (numerator + half) / denominator
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses decimal strings such as `"90"`, `"90.5"` or `"90.50"`.
///
/// At most two fractional digits are accepted: amounts are currency-scale
/// and silently rounding caller input would hide mistakes.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must be a decimal number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }
        if frac.len() > 2 {
            return Err(invalid("at most 2 decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("must be a decimal number"))? * 10,
            _ => frac.parse().map_err(|_| invalid("must be a decimal number"))?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`270.00`). The currency symbol is configuration,
/// see [`Money::format_with`].
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(Money::from_cents(29700).format_with("₿"), "₿297.00");
        assert_eq!(Money::from_cents(-1000).format_with("$"), "-$10.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("90".parse::<Money>().unwrap().cents(), 9000);
        assert_eq!("90.5".parse::<Money>().unwrap().cents(), 9050);
        assert_eq!("90.05".parse::<Money>().unwrap().cents(), 9005);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-3.10".parse::<Money>().unwrap().cents(), -310);

        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_cents(i64::MAX / 2);

        assert_eq!(Money::from_cents(9000).checked_multiply_quantity(3), Some(Money::from_cents(27000)));
        assert_eq!(big.checked_multiply_quantity(3), None);
        assert_eq!(big.checked_add(big), Some(Money::from_cents(i64::MAX - 1)));
        assert_eq!(big.checked_add(Money::from_cents(i64::MAX)), None);
    }

    #[test]
    fn test_tax_ten_percent() {
        let subtotal = Money::from_cents(27000);
        let tax = subtotal.calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 2700);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 10.05 × 10% = 1.005 → 1.01
        assert_eq!(Money::from_cents(1005).calculate_tax(TaxRate::from_bps(1000)).cents(), 101);
        // 10.04 × 10% = 1.004 → 1.00
        assert_eq!(Money::from_cents(1004).calculate_tax(TaxRate::from_bps(1000)).cents(), 100);
    }

    #[test]
    fn test_mean() {
        assert_eq!(Money::mean(Money::from_cents(1000), 3).cents(), 333);
        assert_eq!(Money::mean(Money::from_cents(1001), 2).cents(), 501);
        assert_eq!(Money::mean(Money::from_cents(1000), 0), Money::zero());
    }

    #[test]
    fn test_div_round_negative() {
        assert_eq!(div_round(-15, 10), -2);
        assert_eq!(div_round(-14, 10), -1);
        assert_eq!(div_round(15, 10), 2);
    }
}
