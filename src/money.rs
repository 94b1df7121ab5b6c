//! Money
//!
//! Minor-unit arithmetic shared by the offer model and the discount calculations.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised while converting or scaling monetary amounts.
#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    /// The decimal amount cannot be represented in the currency's minor units.
    #[error("amount {0} cannot be represented in minor units")]
    Unrepresentable(Decimal),

    /// Minor-unit arithmetic overflowed.
    #[error("minor unit arithmetic overflowed")]
    Overflow,
}

/// Convert a decimal amount in major units (e.g. `12.50`) into money of the given currency.
///
/// Amounts with more precision than the currency supports are rounded midpoint away from zero.
///
/// # Errors
///
/// Returns [`AmountError::Unrepresentable`] if the amount does not fit in an `i64` of minor units.
pub fn from_decimal(
    amount: Decimal,
    currency: &Currency,
) -> Result<Money<'_, Currency>, AmountError> {
    Ok(Money::from_minor(minor_units(amount, currency)?, currency))
}

/// Convert a decimal amount in major units into minor units of the given currency.
///
/// # Errors
///
/// Returns [`AmountError::Unrepresentable`] if the amount does not fit in an `i64` of minor units.
pub fn minor_units(amount: Decimal, currency: &Currency) -> Result<i64, AmountError> {
    let scale = 10_i64
        .checked_pow(currency.exponent)
        .ok_or(AmountError::Unrepresentable(amount))?;

    amount
        .checked_mul(Decimal::from(scale))
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .ok_or(AmountError::Unrepresentable(amount))
}

/// Return the amount of `money` in major units.
pub fn to_decimal(money: &Money<'_, Currency>) -> Decimal {
    *money.amount()
}

/// Multiply a price by a quantity.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the result does not fit in minor units.
pub fn times<'a>(
    price: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, AmountError> {
    let minor = price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(AmountError::Overflow)?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Sum a list of amounts, starting from zero in `currency`.
///
/// # Errors
///
/// Returns a [`MoneyError`] on currency mismatch.
pub fn sum<'a>(
    currency: &'a Currency,
    amounts: impl IntoIterator<Item = Money<'a, Currency>>,
) -> Result<Money<'a, Currency>, MoneyError> {
    amounts
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, amount| acc.add(amount))
}

/// Calculate a percentage of an amount in minor units.
///
/// # Errors
///
/// Returns [`AmountError::Unrepresentable`] if the rounded result does not fit in an `i64`.
pub fn percent_of_minor(percent: Percentage, minor: i64) -> Result<i64, AmountError> {
    let applied: Decimal = percent * Decimal::from(minor);

    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    rounded
        .to_i64()
        .ok_or(AmountError::Unrepresentable(rounded))
}

/// Split `total` minor units across `weights`, proportionally.
///
/// Each share is floored and the leftover units are handed out one at a time from the
/// front, so the shares always sum to `total`. When every weight is zero the total is
/// split evenly.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if a share cannot be represented.
pub fn allocate(total: i64, weights: &[i64]) -> Result<SmallVec<[i64; 8]>, AmountError> {
    if weights.is_empty() {
        return Ok(SmallVec::new());
    }

    let weight_sum: i128 = weights.iter().map(|w| i128::from((*w).max(0))).sum();

    let weights: SmallVec<[i128; 8]> = if weight_sum > 0 {
        weights.iter().map(|w| i128::from((*w).max(0))).collect()
    } else {
        weights.iter().map(|_| 1).collect()
    };

    let weight_sum: i128 = weights.iter().sum();
    let total_wide = i128::from(total);

    let mut shares: SmallVec<[i64; 8]> = weights
        .iter()
        .map(|w| i64::try_from(total_wide * w / weight_sum).map_err(|_err| AmountError::Overflow))
        .collect::<Result<_, _>>()?;

    let allocated = shares
        .iter()
        .try_fold(0_i64, |acc, share| acc.checked_add(*share))
        .ok_or(AmountError::Overflow)?;

    let mut remainder = total - allocated;

    for share in &mut shares {
        if remainder <= 0 {
            break;
        }

        *share += 1;
        remainder -= 1;
    }

    Ok(shares)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, JPY, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn from_decimal_scales_by_currency_exponent() -> TestResult {
        assert_eq!(
            from_decimal(Decimal::new(1250, 2), USD)?,
            Money::from_minor(1250, USD)
        );
        assert_eq!(
            from_decimal(Decimal::new(500, 0), JPY)?,
            Money::from_minor(500, JPY)
        );

        Ok(())
    }

    #[test]
    fn minor_units_rounds_midpoint_away_from_zero() -> TestResult {
        assert_eq!(minor_units(Decimal::new(10_005, 3), GBP)?, 1001);

        Ok(())
    }

    #[test]
    fn minor_units_rejects_unrepresentable_amounts() {
        let result = minor_units(Decimal::MAX, GBP);

        assert!(matches!(result, Err(AmountError::Unrepresentable(_))));
    }

    #[test]
    fn times_multiplies_minor_units() -> TestResult {
        let price = Money::from_minor(2000, USD);

        assert_eq!(times(&price, 3)?, Money::from_minor(6000, USD));

        Ok(())
    }

    #[test]
    fn times_reports_overflow() {
        let price = Money::from_minor(i64::MAX, USD);

        assert_eq!(times(&price, 2), Err(AmountError::Overflow));
    }

    #[test]
    fn sum_of_nothing_is_zero() -> TestResult {
        assert_eq!(sum(GBP, [])?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn sum_rejects_mixed_currencies() {
        let result = sum(
            GBP,
            [Money::from_minor(100, GBP), Money::from_minor(100, USD)],
        );

        assert!(result.is_err(), "mixed currencies should not sum");
    }

    #[test]
    fn percent_of_minor_rounds_to_nearest_unit() -> TestResult {
        let percent = Percentage::from(Decimal::new(15, 2));

        assert_eq!(percent_of_minor(percent, 333)?, 50);

        Ok(())
    }

    #[test]
    fn allocate_splits_proportionally_and_keeps_total() -> TestResult {
        let shares = allocate(700, &[4000, 3000])?;

        assert_eq!(shares.as_slice(), &[400, 300]);

        let shares = allocate(100, &[1, 1, 1])?;

        assert_eq!(shares.as_slice(), &[34, 33, 33]);

        Ok(())
    }

    #[test]
    fn allocate_with_zero_weights_splits_evenly() -> TestResult {
        let shares = allocate(10, &[0, 0])?;

        assert_eq!(shares.as_slice(), &[5, 5]);

        Ok(())
    }

    #[test]
    fn allocate_nothing_returns_no_shares() -> TestResult {
        assert!(allocate(500, &[])?.is_empty());

        Ok(())
    }
}
