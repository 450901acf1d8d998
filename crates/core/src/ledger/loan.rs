//! Loan principal and interest arithmetic.
//!
//! A loan stores the total credited to the borrower. The lender is only ever debited
//! the principal, so `total = principal * (1 + rate / 100)` and the principal is
//! recovered by dividing the total back down.

use rust_decimal::Decimal;
use fundline_shared::types::Money;

use super::error::{LedgerError, LedgerResult};

/// Principal/interest split of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerms {
    /// Amount debited from the lender.
    pub principal: Money,
    /// Interest added on top of the principal.
    pub interest: Money,
    /// Amount credited to the borrower and stored on the loan.
    pub total: Money,
}

impl LoanTerms {
    /// Computes the terms for a new loan from the principal the lender provides.
    pub fn from_principal(principal: Money, interest_rate: Decimal) -> LedgerResult<Self> {
        let interest = principal
            .checked_mul(rate_fraction(interest_rate)?)
            .ok_or_else(LedgerError::out_of_range)?;
        let total = principal
            .checked_add(interest)
            .ok_or_else(LedgerError::out_of_range)?;
        Ok(Self {
            principal,
            interest,
            total,
        })
    }

    /// Splits a stored loan total back into principal and interest.
    pub fn from_total(total: Money, interest_rate: Decimal) -> LedgerResult<Self> {
        let factor = Decimal::ONE
            .checked_add(rate_fraction(interest_rate)?)
            .ok_or_else(LedgerError::out_of_range)?;
        let principal = total
            .checked_div(factor)
            .ok_or_else(LedgerError::out_of_range)?;
        Ok(Self {
            principal,
            interest: total - principal,
            total,
        })
    }
}

fn rate_fraction(interest_rate: Decimal) -> LedgerResult<Decimal> {
    if interest_rate.is_sign_negative() && !interest_rate.is_zero() {
        return Err(LedgerError::InvalidOperation(
            "Interest rate cannot be negative".to_string(),
        ));
    }
    interest_rate
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or_else(LedgerError::out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_terms_from_principal() {
        let terms = LoanTerms::from_principal(Money::new(dec!(1000)), dec!(10)).unwrap();
        assert_eq!(terms.interest, Money::new(dec!(100)));
        assert_eq!(terms.total, Money::new(dec!(1100)));
    }

    #[test]
    fn test_terms_from_total() {
        let terms = LoanTerms::from_total(Money::new(dec!(1100)), dec!(10)).unwrap();
        assert_eq!(terms.principal, Money::new(dec!(1000)));
        assert_eq!(terms.interest, Money::new(dec!(100)));
    }

    #[rstest]
    #[case(dec!(1000), dec!(0))]
    #[case(dec!(1000), dec!(10))]
    #[case(dec!(250.50), dec!(3))]
    #[case(dec!(99.99), dec!(12.5))]
    fn test_principal_round_trips(#[case] principal: Decimal, #[case] rate: Decimal) {
        let total = LoanTerms::from_principal(Money::new(principal), rate)
            .unwrap()
            .total;
        let back = LoanTerms::from_total(total, rate).unwrap();
        assert_eq!(back.principal, Money::new(principal));
    }

    #[test]
    fn test_total_overflow_rejected() {
        let err = LoanTerms::from_principal(Money::new(Decimal::MAX), dec!(10)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOperation(ref msg) if msg == "amount out of range"));
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(matches!(
            LoanTerms::from_principal(Money::new(dec!(100)), dec!(-1)),
            Err(LedgerError::InvalidOperation(_))
        ));
    }
}
