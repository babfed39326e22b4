//! Utility functions and helpers

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use super::errors::StakingError;

/// Number of decimal places stake amounts are shown and distributed with
pub const DISPLAY_DECIMALS: u32 = 2;

/// Drop any precision beyond the display decimals (1277.12999 -> 1277.12)
pub fn truncate_to_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::ToZero)
}

/// `numerator / denominator`, or `fallback` when the denominator is zero
pub fn share_of(numerator: Decimal, denominator: Decimal, fallback: Decimal) -> Result<Decimal, StakingError> {
    if denominator.is_zero() {
        return Ok(fallback);
    }
    numerator
        .checked_div(denominator)
        .ok_or(StakingError::ArithmeticOverflow("share"))
}

/// Sum of decimals, failing instead of panicking on overflow
pub fn checked_sum<I>(values: I, what: &'static str) -> Result<Decimal, StakingError>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .ok_or(StakingError::ArithmeticOverflow(what))
}

/// Fractional power of a non-negative base in decimal arithmetic.
/// A zero base yields zero for any positive exponent.
pub fn checked_pow(base: Decimal, exponent: Decimal, what: &'static str) -> Result<Decimal, StakingError> {
    if base.is_zero() && exponent.is_sign_positive() && !exponent.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if base.is_sign_negative() {
        return Err(StakingError::ArithmeticOverflow(what));
    }
    base.checked_powd(exponent)
        .ok_or(StakingError::ArithmeticOverflow(what))
}

/// Format amount with the display decimals
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", truncate_to_display(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_truncate_to_display() {
        assert_eq!(truncate_to_display(dec!(1277.12999)), dec!(1277.12));
        assert_eq!(truncate_to_display(dec!(470)), dec!(470));
        assert_eq!(truncate_to_display(dec!(0.009)), dec!(0));
    }

    #[test]
    fn test_share_of_zero_denominator() {
        assert_eq!(share_of(dec!(5), Decimal::ZERO, Decimal::ONE).unwrap(), Decimal::ONE);
        assert_eq!(share_of(dec!(5), dec!(20), Decimal::ONE).unwrap(), dec!(0.25));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum(vec![dec!(1.5), dec!(2.25)], "test").unwrap(), dec!(3.75));
        assert_eq!(checked_sum(Vec::new(), "test").unwrap(), Decimal::ZERO);
        assert_eq!(
            checked_sum(vec![Decimal::MAX, dec!(1)], "test").unwrap_err(),
            StakingError::ArithmeticOverflow("test")
        );
    }

    #[test]
    fn test_checked_pow() {
        assert_eq!(checked_pow(Decimal::ZERO, dec!(0.5), "test").unwrap(), Decimal::ZERO);
        let root = checked_pow(dec!(4), dec!(0.5), "test").unwrap();
        assert!((root - dec!(2)).abs() < dec!(0.000000001));
        assert!(checked_pow(dec!(-4), dec!(0.5), "test").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(123456789.129)), "123456789.12");
        assert_eq!(format_amount(dec!(5)), "5.00");
    }
}
