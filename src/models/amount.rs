use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::errors::AmountValidationError;

/// A token amount carried both as minor units and as a decimal string.
///
/// `amount` and `amount_unformatted` always agree under `decimals`; build
/// values through [`Amount::from_unformatted`] or [`Amount::from_string`]
/// rather than by hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub amount: String,
    pub amount_unformatted: U256,
    pub amount_pretty: String,
    pub decimals: u8,
}

impl Amount {
    pub fn from_unformatted(amount_unformatted: U256, decimals: u8) -> Self {
        let amount = format_units(amount_unformatted, decimals);
        let amount_pretty = number_with_commas(&amount);
        Self {
            amount,
            amount_unformatted,
            amount_pretty,
            decimals,
        }
    }

    /// Parses a user supplied decimal string. Negative input is refused.
    pub fn from_string(value: &str, decimals: u8) -> Result<Self, AmountValidationError> {
        let (negative, amount_unformatted) = parse_units(value, decimals)?;
        if negative && !amount_unformatted.is_zero() {
            return Err(AmountValidationError::Negative);
        }
        Ok(Self::from_unformatted(amount_unformatted, decimals))
    }

    pub fn is_zero(&self) -> bool {
        self.amount_unformatted.is_zero()
    }
}

/// Formats minor units as a decimal string with trailing zeros trimmed.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let decimals = decimals as usize;
    let mut amount_str = amount.to_string();
    if decimals == 0 {
        return amount_str;
    }

    if amount_str.len() <= decimals {
        amount_str.insert_str(0, &"0".repeat(decimals - amount_str.len() + 1));
    }
    let point = amount_str.len() - decimals;
    amount_str.insert(point, '.');

    let trimmed = amount_str.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parses a decimal string into minor units, returning the sign separately.
///
/// Fails with `Required` for blank input, `NotANumber` for anything that is
/// not `[-]digits[.digits]`, `TooPrecise` when the fraction is longer than
/// `decimals`, and `InsufficientFunds` when the value does not fit in 256
/// bits.
pub fn parse_units(value: &str, decimals: u8) -> Result<(bool, U256), AmountValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AmountValidationError::Required);
    }

    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (digits, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (integer.is_empty() && fraction.is_empty()) || !all_digits(integer) || !all_digits(fraction)
    {
        return Err(AmountValidationError::NotANumber);
    }

    if max_precision(digits) > decimals as usize {
        return Err(AmountValidationError::TooPrecise { max: decimals });
    }

    let mut combined = String::with_capacity(integer.len() + decimals as usize);
    combined.push_str(if integer.is_empty() { "0" } else { integer });
    combined.push_str(fraction);
    combined.push_str(&"0".repeat(decimals as usize - fraction.len()));

    // digits were checked above, so only overflow is left: a value no balance
    // can cover
    let units = U256::from_dec_str(&combined).map_err(|_| {
        if negative {
            AmountValidationError::Negative
        } else {
            AmountValidationError::InsufficientFunds
        }
    })?;
    Ok((negative, units))
}

/// Number of digits after the decimal point.
pub fn max_precision(value: &str) -> usize {
    value.split_once('.').map_or(0, |(_, fraction)| fraction.len())
}

/// `a * b / denominator`, dividing first when the product would overflow.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
    match a.checked_mul(b) {
        Some(product) => product / denominator,
        None => (a / denominator).saturating_mul(b),
    }
}

/// Groups the integer part with commas and keeps at most two fraction digits.
pub fn number_with_commas(amount: &str) -> String {
    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let fraction: String = fraction.chars().take(2).collect();
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_units_with_trimmed_zeros() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(100u64), 0), "100");
        assert_eq!(format_units(U256::zero(), 18), "0");
        assert_eq!(format_units(U256::from(5u64), 3), "0.005");
        assert_eq!(format_units(U256::from(10_000_000u64), 6), "10");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(parse_units("1.5", 6), Ok((false, U256::from(1_500_000u64))));
        assert_eq!(parse_units(".5", 1), Ok((false, U256::from(5u64))));
        assert_eq!(parse_units("-2", 0), Ok((true, U256::from(2u64))));
        assert_eq!(parse_units("", 6), Err(AmountValidationError::Required));
        assert_eq!(parse_units("abc", 6), Err(AmountValidationError::NotANumber));
        assert_eq!(parse_units("1.2.3", 6), Err(AmountValidationError::NotANumber));
        assert_eq!(parse_units(".", 6), Err(AmountValidationError::NotANumber));
        assert_eq!(
            parse_units("0.1234567", 6),
            Err(AmountValidationError::TooPrecise { max: 6 })
        );
    }

    #[test]
    fn oversized_numbers_exceed_any_balance() {
        let huge = "9".repeat(80);
        assert_eq!(
            parse_units(&huge, 18),
            Err(AmountValidationError::InsufficientFunds)
        );
        assert_eq!(
            parse_units(&format!("-{}", huge), 0),
            Err(AmountValidationError::Negative)
        );
    }

    #[test]
    fn string_amount_survives_round_trip() {
        for value in ["10", "0.000001", "123456.789", "1"] {
            let amount = Amount::from_string(value, 18).unwrap();
            let again = Amount::from_unformatted(amount.amount_unformatted, 18);
            assert_eq!(again.amount, value);
            assert_eq!(again, amount);
        }
    }

    #[test]
    fn refuses_negative_amounts() {
        assert_eq!(
            Amount::from_string("-1", 18),
            Err(AmountValidationError::Negative)
        );
    }

    #[test]
    fn pretty_prints_with_commas() {
        assert_eq!(number_with_commas("1234567.891"), "1,234,567.89");
        assert_eq!(number_with_commas("999"), "999");
        assert_eq!(number_with_commas("1000.001"), "1,000");
        assert_eq!(number_with_commas("0.5"), "0.5");
    }

    #[test]
    fn mul_div_scales_down() {
        let ten = U256::exp10(19);
        let one_and_half = U256::from(15u64) * U256::exp10(17);
        assert_eq!(
            mul_div(ten, one_and_half, U256::exp10(18)),
            U256::from(15u64) * U256::exp10(18)
        );
    }
}
