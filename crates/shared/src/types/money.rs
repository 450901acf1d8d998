//! Money type with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the single ledger currency.
///
/// Uses `Decimal` internally so comparisons and increments are exact. Serializes as a
/// decimal string (`"100.50"`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Adds two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Subtracts two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Multiplies by a decimal factor, `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    /// Divides by a decimal divisor, `None` on overflow or division by zero.
    #[must_use]
    pub fn checked_div(self, divisor: Decimal) -> Option<Self> {
        self.0.checked_div(divisor).map(Self)
    }

    /// Renders the amount rounded to two decimal places, e.g. `500.00`.
    #[must_use]
    pub fn to_fixed(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Decimal::from_str_exact(s.trim())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_zero() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert_eq!(Money::default(), Money::ZERO);
    }

    #[test]
    fn test_money_arithmetic_is_exact() {
        let mut balance = Money::new(dec!(0.1));
        balance += Money::new(dec!(0.2));
        assert_eq!(balance, Money::new(dec!(0.3)));

        balance -= Money::new(dec!(0.3));
        assert!(balance.is_zero());
        assert_eq!(-Money::new(dec!(5)), Money::new(dec!(-5)));
    }

    #[test]
    fn test_money_comparisons() {
        assert!(Money::new(dec!(50)) < Money::new(dec!(100)));
        assert!(Money::new(dec!(100.00)) >= Money::new(dec!(100)));
        assert_eq!(Money::new(dec!(100.00)), Money::new(dec!(100)));
    }

    #[test]
    fn test_money_sum() {
        let amounts = [Money::new(dec!(400)), Money::new(dec!(600))];
        assert_eq!(amounts.iter().sum::<Money>(), Money::new(dec!(1000)));
        assert_eq!(
            Vec::<Money>::new().into_iter().sum::<Money>(),
            Money::ZERO
        );
    }

    #[rstest]
    #[case(dec!(500), "500.00")]
    #[case(dec!(600.5), "600.50")]
    #[case(dec!(24.99975), "25.00")]
    #[case(dec!(0), "0.00")]
    fn test_money_to_fixed(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(Money::new(amount).to_fixed(), expected);
    }

    #[test]
    fn test_money_checked_ops() {
        let total = Money::new(dec!(1100));
        assert_eq!(total.checked_div(dec!(1.1)), Some(Money::new(dec!(1000))));
        assert_eq!(total.checked_div(Decimal::ZERO), None);
        assert_eq!(
            Money::new(dec!(1000)).checked_mul(dec!(0.1)),
            Some(Money::new(dec!(100)))
        );
    }

    #[test]
    fn test_money_checked_add_sub_overflow() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.checked_add(Money::new(dec!(1))), None);
        assert_eq!(Money::new(Decimal::MIN).checked_sub(Money::new(dec!(1))), None);
        assert_eq!(
            Money::new(dec!(400)).checked_add(Money::new(dec!(600))),
            Some(Money::new(dec!(1000)))
        );
        assert_eq!(
            Money::new(dec!(50)).checked_sub(Money::new(dec!(100))),
            Some(Money::new(dec!(-50)))
        );
    }

    #[test]
    fn test_money_serializes_as_string() {
        let json = serde_json::to_string(&Money::new(dec!(100.50))).unwrap();
        assert_eq!(json, "\"100.50\"");
        let parsed: Money = serde_json::from_str("\"42.10\"").unwrap();
        assert_eq!(parsed, Money::new(dec!(42.10)));
    }

    #[test]
    fn test_money_from_str() {
        assert_eq!(Money::from_str("12.34").unwrap(), Money::new(dec!(12.34)));
        assert!(Money::from_str("abc").is_err());
    }
}
