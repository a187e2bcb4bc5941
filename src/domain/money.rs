use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Exact fixed-point monetary value, scale 2, rounded half-up.
///
/// Every balance and amount in the ledger goes through this type; binary
/// floating point never touches money.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps a decimal, rounding to cents half-up.
    pub fn new(value: Decimal) -> Self {
        Money(round2(value))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiplies by a rate (e.g. a monthly interest rate) and rounds the
    /// product back to cents half-up.
    pub fn mul_rate(&self, rate: Decimal) -> Money {
        Money(round2(self.0 * rate))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Derives a per-month rate from an annual one: `annual / 12` held at 10
/// decimal digits, half-up. The interest job and the projection must share
/// this exact intermediate precision or their results drift apart.
pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
    (annual_rate / Decimal::from(12))
        .round_dp_with_strategy(10, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_up_to_cents() {
        assert_eq!(Money::new(dec!(2.005)).amount(), dec!(2.01));
        assert_eq!(Money::new(dec!(2.004)).amount(), dec!(2.00));
        assert_eq!(Money::new(dec!(2.0050001)).amount(), dec!(2.01));
    }

    #[test]
    fn add_and_sub_keep_exact_cents() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(50.00));
        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
    }

    #[test]
    fn monthly_rate_holds_ten_digits() {
        assert_eq!(monthly_rate(dec!(0.04)), dec!(0.0033333333));
        assert_eq!(monthly_rate(dec!(0.01)), dec!(0.0008333333));
    }

    #[test]
    fn mul_rate_matches_reference_interest() {
        // 1200.00 at 4% annual: 1200 * 0.0033333333 = 3.99999996 -> 4.00
        let interest = Money::new(dec!(1200.00)).mul_rate(monthly_rate(dec!(0.04)));
        assert_eq!(interest.amount(), dec!(4.00));
    }

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(Money::new(dec!(150)).to_string(), "150.00");
        assert_eq!(Money::new(dec!(0.5)).to_string(), "0.50");
    }
}
