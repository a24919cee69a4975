//! Fixed-point conversion between human decimal strings and the integer
//! amounts token contracts work in (`amount × 10^decimals`).

use alloy_primitives::U256;
use thiserror::Error;

/// Largest decimals value whose scale factor still fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount is required")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("invalid character '{0}' in amount")]
    InvalidCharacter(char),
    #[error("amount has more than one decimal point")]
    MultiplePoints,
    #[error("amount has no digits")]
    NoDigits,
    #[error("amount does not fit in 256 bits")]
    Overflow,
    #[error("decimals {0} exceeds the supported maximum of {MAX_DECIMALS}")]
    DecimalsTooLarge(u8),
}

/// `10^decimals`.
pub fn scale_factor(decimals: u8) -> Result<U256, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::DecimalsTooLarge(decimals));
    }
    Ok(U256::from(10u8).pow(U256::from(decimals)))
}

/// Converts a decimal string into its integer representation scaled by
/// `10^decimals`. Fractional digits beyond `decimals` are rounded half-up.
pub fn parse_units(text: &str, decimals: u8) -> Result<U256, UnitsError> {
    let scale = scale_factor(decimals)?;
    let (whole, fraction) = split_decimal(text)?;

    let decimals = usize::from(decimals);
    let (kept, dropped) = if fraction.len() > decimals {
        fraction.split_at(decimals)
    } else {
        (fraction, "")
    };

    let whole_value = digits_to_u256(whole)?
        .checked_mul(scale)
        .ok_or(UnitsError::Overflow)?;

    // kept has at most `decimals` digits, so the padding exponent is <= MAX_DECIMALS
    let padding = scale_factor((decimals - kept.len()) as u8)?;
    let fraction_value = digits_to_u256(kept)?
        .checked_mul(padding)
        .ok_or(UnitsError::Overflow)?;

    let mut value = whole_value
        .checked_add(fraction_value)
        .ok_or(UnitsError::Overflow)?;

    if dropped.as_bytes().first().is_some_and(|digit| *digit >= b'5') {
        value = value
            .checked_add(U256::from(1u8))
            .ok_or(UnitsError::Overflow)?;
    }

    Ok(value)
}

/// Formats a scaled integer back to decimal text. Trailing fractional zeros
/// are trimmed but one fractional digit is always kept (`1.0`, `0.5`).
pub fn format_units(value: U256, decimals: u8) -> Result<String, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::DecimalsTooLarge(decimals));
    }

    let digits = value.to_string();
    let decimals = usize::from(decimals);
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    Ok(format!("{whole}.{fraction}"))
}

/// Rounds a non-negative decimal string to exactly `places` fractional
/// digits, half-up.
pub fn round_display(text: &str, places: usize) -> Result<String, UnitsError> {
    let (whole, fraction) = split_decimal(text)?;

    let mut digits: Vec<u8> = whole.bytes().map(|b| b - b'0').collect();
    if digits.is_empty() {
        digits.push(0);
    }

    let mut fraction_digits: Vec<u8> = fraction.bytes().map(|b| b - b'0').collect();
    let round_up = fraction_digits.get(places).is_some_and(|digit| *digit >= 5);
    fraction_digits.resize(places, 0);
    digits.extend(fraction_digits);

    if round_up {
        let mut index = digits.len();
        loop {
            if index == 0 {
                digits.insert(0, 1);
                break;
            }
            index -= 1;
            if digits[index] == 9 {
                digits[index] = 0;
            } else {
                digits[index] += 1;
                break;
            }
        }
    }

    let split = digits.len() - places;
    let render = |slice: &[u8]| slice.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let whole_text = render(&digits[..split]);
    let whole_text = whole_text.trim_start_matches('0');
    let whole_text = if whole_text.is_empty() { "0" } else { whole_text };

    if places == 0 {
        Ok(whole_text.to_owned())
    } else {
        Ok(format!("{whole_text}.{}", render(&digits[split..])))
    }
}

fn split_decimal(text: &str) -> Result<(&str, &str), UnitsError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(UnitsError::Negative);
    }

    let mut parts = trimmed.splitn(3, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(UnitsError::MultiplePoints);
    }

    if let Some(bad) = whole.chars().chain(fraction.chars()).find(|c| !c.is_ascii_digit()) {
        return Err(UnitsError::InvalidCharacter(bad));
    }
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::NoDigits);
    }

    Ok((whole, fraction))
}

fn digits_to_u256(digits: &str) -> Result<U256, UnitsError> {
    let ten = U256::from(10u8);
    digits.bytes().try_fold(U256::ZERO, |acc, byte| {
        acc.checked_mul(ten)
            .and_then(|acc| acc.checked_add(U256::from(byte - b'0')))
            .ok_or(UnitsError::Overflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(value: &str) -> U256 {
        value.parse().unwrap()
    }

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_units("1000000", 18).unwrap(), u("1000000000000000000000000"));
        assert_eq!(parse_units("1.5", 18).unwrap(), u("1500000000000000000"));
        assert_eq!(parse_units("0.000001", 6).unwrap(), u("1"));
        assert_eq!(parse_units(".25", 2).unwrap(), u("25"));
        assert_eq!(parse_units("7.", 0).unwrap(), u("7"));
        assert_eq!(parse_units("  42 ", 0).unwrap(), u("42"));
    }

    #[test]
    fn rounds_excess_fraction_half_up() {
        assert_eq!(parse_units("1.234", 2).unwrap(), u("123"));
        assert_eq!(parse_units("1.235", 2).unwrap(), u("124"));
        assert_eq!(parse_units("0.9999", 3).unwrap(), u("1000"));
        assert_eq!(parse_units("2.5", 0).unwrap(), u("3"));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units("   ", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units("-1", 18), Err(UnitsError::Negative));
        assert_eq!(parse_units("1e18", 0), Err(UnitsError::InvalidCharacter('e')));
        assert_eq!(parse_units("1.2.3", 18), Err(UnitsError::MultiplePoints));
        assert_eq!(parse_units(".", 18), Err(UnitsError::NoDigits));
        assert_eq!(parse_units("1", 78), Err(UnitsError::DecimalsTooLarge(78)));
    }

    #[test]
    fn detects_overflow() {
        let max = U256::MAX.to_string();
        assert_eq!(parse_units(&max, 0).unwrap(), U256::MAX);
        assert_eq!(parse_units(&max, 1), Err(UnitsError::Overflow));
    }

    #[test]
    fn formats_like_format_units() {
        assert_eq!(format_units(u("1500000000000000000"), 18).unwrap(), "1.5");
        assert_eq!(format_units(u("1000000000000000000"), 18).unwrap(), "1.0");
        assert_eq!(format_units(U256::ZERO, 18).unwrap(), "0.0");
        assert_eq!(format_units(u("1"), 6).unwrap(), "0.000001");
        assert_eq!(format_units(u("42"), 0).unwrap(), "42.0");
    }

    #[test]
    fn display_rounding_carries() {
        assert_eq!(round_display("1.5", 4).unwrap(), "1.5000");
        assert_eq!(round_display("0.00004", 4).unwrap(), "0.0000");
        assert_eq!(round_display("0.00005", 4).unwrap(), "0.0001");
        assert_eq!(round_display("9.99996", 4).unwrap(), "10.0000");
        assert_eq!(round_display("999.5", 0).unwrap(), "1000");
    }

    #[test]
    fn scaled_value_matches_rounded_product() {
        for (text, decimals, expected) in [
            ("12.345678", 6u8, "12345678"),
            ("12.3456785", 6, "12345679"),
            ("0.1", 1, "1"),
        ] {
            assert_eq!(parse_units(text, decimals).unwrap(), u(expected), "{text}");
        }
    }
}
