//! Money types with exact integer-cent arithmetic
//!
//! Every amount inside the audit engine is carried as whole US cents. Decimal
//! dollars only appear at the edges: when extracted documents are parsed and
//! when letters and scripts are rendered for the consumer.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A US dollar amount stored as integer cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates Money from whole cents
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Creates Money from decimal dollars, rounding half away from zero to the cent
    pub fn from_dollars(dollars: Decimal) -> Result<Self, MoneyError> {
        let cents = dollars
            .checked_mul(dec!(100))
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MoneyError::Overflow)?;
        Ok(Self(cents))
    }

    /// Parses a dollar string such as `"$1,234.56"` or `"-12.5"`
    pub fn parse_dollars(raw: &str) -> Result<Self, MoneyError> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
            .collect();

        if cleaned.is_empty() {
            return Err(MoneyError::InvalidAmount(raw.to_string()));
        }

        let dollars: Decimal = cleaned
            .parse()
            .map_err(|_| MoneyError::InvalidAmount(raw.to_string()))?;
        Self::from_dollars(dollars)
    }

    /// Returns the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the amount in decimal dollars
    pub fn to_dollars(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Checked addition
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0.checked_add(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Multiplies by a whole quantity (e.g. units x unit price)
    pub fn times(&self, quantity: u32) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Multiplies by a decimal factor, rounding half away from zero to the cent
    pub fn multiply(&self, factor: Decimal) -> Result<Money, MoneyError> {
        let product = Decimal::from(self.0)
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        product
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Divides evenly, e.g. a line charge by its units. Returns None for zero divisor.
    pub fn per_unit(&self, units: u32) -> Option<Money> {
        if units == 0 {
            return None;
        }
        Some(Self(self.0 / i64::from(units)))
    }

    /// Returns the larger of zero and this amount
    pub fn non_negative(&self) -> Self {
        Self(self.0.max(0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = abs / 100;
        let cents = abs % 100;

        let digits = dollars.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}.{:02}", sign, grouped, cents)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

/// Represents a percentage rate (e.g. coinsurance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.20 for 20%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.20 for 20%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 20.0 for 20%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Applies this rate to a money amount
    pub fn apply(&self, money: &Money) -> Result<Money, MoneyError> {
        money.multiply(self.value)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_dollars() {
        let m = Money::from_dollars(dec!(100.50)).unwrap();
        assert_eq!(m.cents(), 10050);
    }

    #[test]
    fn test_money_parse_dollars_strips_symbols() {
        assert_eq!(Money::parse_dollars("$1,234.56").unwrap().cents(), 123456);
        assert_eq!(Money::parse_dollars(" 45 ").unwrap().cents(), 4500);
    }

    #[test]
    fn test_money_parse_dollars_rejects_garbage() {
        assert!(matches!(
            Money::parse_dollars("N/A"),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(Money::parse_dollars("$").is_err());
    }

    #[test]
    fn test_money_display_groups_thousands() {
        assert_eq!(Money::from_cents(123456).to_string(), "$1,234.56");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-4500).to_string(), "-$45.00");
        assert_eq!(Money::from_cents(100_000_000).to_string(), "$1,000,000.00");
    }

    #[test]
    fn test_money_times_and_per_unit() {
        let unit = Money::from_cents(5000);
        assert_eq!(unit.times(2).unwrap().cents(), 10000);
        assert_eq!(Money::from_cents(15000).per_unit(3).unwrap().cents(), 5000);
        assert!(Money::from_cents(100).per_unit(0).is_none());
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::from_percentage(dec!(20));
        let allowed = Money::from_cents(12345);
        assert_eq!(rate.apply(&allowed).unwrap().cents(), 2469);
        assert_eq!(rate.to_string(), "20%");
    }
}
