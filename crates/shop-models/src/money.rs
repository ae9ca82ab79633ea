use rust_decimal::{Decimal, RoundingStrategy};

/// Minor-unit precision for every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(14,2)` column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, MONEY_SCALE);

/// Rounds to cents, half away from zero (what the card processor does).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent` is on a 0-100 scale.
#[must_use]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

/// Non-negative, whole cents and storable without rounding.
#[must_use]
pub fn is_money_amount(amount: Decimal) -> bool {
    amount >= Decimal::ZERO && amount <= MAX_MONEY && round_money(amount) == amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_of_rounds_half_away_from_zero() {
        assert_eq!(percent_of(dec!(1000), dec!(30)), dec!(300.00));
        assert_eq!(percent_of(dec!(0.05), dec!(50)), dec!(0.03));
        assert_eq!(percent_of(dec!(199.99), dec!(15)), dec!(30.00));
    }

    #[test]
    fn test_money_amount_bounds() {
        assert_eq!(MAX_MONEY, dec!(999999999999.99));
        assert!(is_money_amount(dec!(0)));
        assert!(is_money_amount(dec!(1000.50)));
        assert!(is_money_amount(MAX_MONEY));

        assert!(!is_money_amount(dec!(999.995)));
        assert!(!is_money_amount(dec!(-0.01)));
        assert!(!is_money_amount(MAX_MONEY + dec!(0.01)));
        assert!(!is_money_amount(Decimal::MAX));
    }
}
