//! Integer and decimal helpers shared by the decoder and encoder.

use duck_types::MAX_DECIMAL_WIDTH;
use std::num::IntErrorKind;

/// Why a literal could not be turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralError {
    /// Text does not follow the grammar
    Malformed,
    /// Well-formed but outside the representable range
    OutOfRange,
}

/// `10^exp` as an `i128`, `None` past `10^38`.
pub fn power_of_ten(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// Split a 128-bit signed value into `(high, low)` halves.
pub fn split_i128(value: i128) -> (i64, u64) {
    ((value >> 64) as i64, value as u64)
}

pub fn join_i128(high: i64, low: u64) -> i128 {
    (i128::from(high) << 64) | i128::from(low)
}

/// Split a 128-bit unsigned value into `(high, low)` halves.
pub fn split_u128(value: u128) -> (u64, u64) {
    ((value >> 64) as u64, value as u64)
}

pub fn join_u128(high: u64, low: u64) -> u128 {
    (u128::from(high) << 64) | u128::from(low)
}

/// Check that an unscaled decimal has at most `width` digits.
pub fn fits_width(unscaled: i128, width: u8) -> bool {
    if width > MAX_DECIMAL_WIDTH {
        return false;
    }
    match power_of_ten(u32::from(width)) {
        Some(limit) => unscaled.unsigned_abs() < limit.unsigned_abs(),
        None => false,
    }
}

/// Multiply an unscaled decimal up from `from_scale` to `to_scale`.
///
/// Only widening is supported; `None` if `from_scale > to_scale` or on
/// overflow.
pub fn rescale(unscaled: i128, from_scale: u8, to_scale: u8) -> Option<i128> {
    let shift = to_scale.checked_sub(from_scale)?;
    unscaled.checked_mul(power_of_ten(u32::from(shift))?)
}

fn int_error(kind: &IntErrorKind) -> LiteralError {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => LiteralError::OutOfRange,
        _ => LiteralError::Malformed,
    }
}

/// Parse a base-10 `i128` literal, surrounding whitespace allowed.
pub fn parse_i128(text: &str) -> Result<i128, LiteralError> {
    text.trim()
        .parse::<i128>()
        .map_err(|e| int_error(e.kind()))
}

/// Parse a base-10 `u128` literal, surrounding whitespace allowed.
pub fn parse_u128(text: &str) -> Result<u128, LiteralError> {
    let text = text.trim();
    if text.starts_with('-') {
        return match text[1..].parse::<u128>() {
            Ok(0) => Ok(0),
            Ok(_) => Err(LiteralError::OutOfRange),
            Err(e) => Err(int_error(e.kind())),
        };
    }
    text.parse::<u128>().map_err(|e| int_error(e.kind()))
}

/// Round a float to the nearest `i128`; `None` if not finite or out of range.
pub fn float_to_i128(value: f64) -> Option<i128> {
    let rounded = value.round();
    // i128::MAX as f64 rounds up to 2^127, which is itself out of range
    if !rounded.is_finite() || rounded < i128::MIN as f64 || rounded >= i128::MAX as f64 {
        return None;
    }
    Some(rounded as i128)
}

/// Round a float to the nearest `u128`; `None` if not finite or out of range.
pub fn float_to_u128(value: f64) -> Option<u128> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded >= u128::MAX as f64 {
        return None;
    }
    Some(rounded as u128)
}

/// Unscaled decimal for a float at the given scale, rounded to nearest.
pub fn float_to_decimal(value: f64, scale: u8) -> Option<i128> {
    float_to_i128(value * 10f64.powi(i32::from(scale)))
}

/// Parse a decimal literal into an unscaled integer at `scale`.
///
/// Accepts an optional sign, digits with an optional fractional part and an
/// optional exponent (`-12.5`, `.5`, `1e3`, `2.50E-1`). Digits beyond the
/// scale are rounded half away from zero.
pub fn parse_decimal_literal(text: &str, scale: u8) -> Result<i128, LiteralError> {
    let text = text.trim();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => {
            let exp_text = &rest[pos + 1..];
            let exp = exp_text
                .parse::<i32>()
                .map_err(|e| int_error(e.kind()))?;
            (&rest[..pos], i64::from(exp))
        }
        None => (rest, 0),
    };

    let (int_digits, frac_digits) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(LiteralError::Malformed);
    }
    if !int_digits.bytes().all(|b| b.is_ascii_digit())
        || !frac_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(LiteralError::Malformed);
    }

    // value = digits * 10^shift at the target scale
    let digits: String = format!("{int_digits}{frac_digits}");
    let digits = digits.trim_start_matches('0');
    let shift = exponent - frac_digits.len() as i64 + i64::from(scale);

    let magnitude = if digits.is_empty() {
        0
    } else if shift >= 0 {
        let base = digits
            .parse::<i128>()
            .map_err(|_| LiteralError::OutOfRange)?;
        let factor = u32::try_from(shift)
            .ok()
            .and_then(power_of_ten)
            .ok_or(LiteralError::OutOfRange)?;
        base.checked_mul(factor).ok_or(LiteralError::OutOfRange)?
    } else {
        let keep = digits.len() as i64 + shift;
        if keep < 0 {
            0
        } else {
            let keep = keep as usize;
            let kept = if keep == 0 {
                0
            } else {
                digits[..keep]
                    .parse::<i128>()
                    .map_err(|_| LiteralError::OutOfRange)?
            };
            let round_up = digits.as_bytes().get(keep).is_some_and(|d| *d >= b'5');
            if round_up {
                kept.checked_add(1).ok_or(LiteralError::OutOfRange)?
            } else {
                kept
            }
        }
    };

    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hugeint_halves() {
        for value in [0i128, 1, -1, i128::MAX, i128::MIN, 1 << 64, -(1 << 64) + 7] {
            let (high, low) = split_i128(value);
            assert_eq!(join_i128(high, low), value);
        }
        assert_eq!(split_i128(-1), (-1, u64::MAX));
        assert_eq!(split_i128(1 << 64), (1, 0));

        let (high, low) = split_u128(u128::MAX);
        assert_eq!((high, low), (u64::MAX, u64::MAX));
        assert_eq!(join_u128(high, low), u128::MAX);
    }

    #[test]
    fn test_fits_width() {
        assert!(fits_width(99_999, 5));
        assert!(fits_width(-99_999, 5));
        assert!(!fits_width(100_000, 5));
        assert!(fits_width(0, 1));
        assert!(!fits_width(1, 39));
    }

    #[test]
    fn test_rescale() {
        assert_eq!(rescale(125, 1, 3), Some(12_500));
        assert_eq!(rescale(125, 3, 1), None);
        assert_eq!(rescale(i128::MAX, 0, 1), None);
    }

    #[test]
    fn test_parse_u128_negative_zero() {
        assert_eq!(parse_u128("-0"), Ok(0));
        assert_eq!(parse_u128("-1"), Err(LiteralError::OutOfRange));
        assert_eq!(parse_u128("abc"), Err(LiteralError::Malformed));
        assert_eq!(
            parse_u128("340282366920938463463374607431768211456"),
            Err(LiteralError::OutOfRange)
        );
    }

    #[test]
    fn test_parse_decimal_literal() {
        assert_eq!(parse_decimal_literal("12.5", 2), Ok(1250));
        assert_eq!(parse_decimal_literal("-12.5", 2), Ok(-1250));
        assert_eq!(parse_decimal_literal(".5", 1), Ok(5));
        assert_eq!(parse_decimal_literal("7.", 0), Ok(7));
        assert_eq!(parse_decimal_literal("1e3", 0), Ok(1000));
        assert_eq!(parse_decimal_literal("2.50E-1", 2), Ok(25));
        assert_eq!(parse_decimal_literal(" 42 ", 0), Ok(42));
    }

    #[test]
    fn test_parse_decimal_literal_rounding() {
        assert_eq!(parse_decimal_literal("1.235", 2), Ok(124));
        assert_eq!(parse_decimal_literal("1.234", 2), Ok(123));
        assert_eq!(parse_decimal_literal("-1.235", 2), Ok(-124));
        assert_eq!(parse_decimal_literal("0.005", 2), Ok(1));
        assert_eq!(parse_decimal_literal("0.0049", 2), Ok(0));
        assert_eq!(parse_decimal_literal("0.0000001", 2), Ok(0));
    }

    #[test]
    fn test_parse_decimal_literal_errors() {
        assert_eq!(parse_decimal_literal("", 2), Err(LiteralError::Malformed));
        assert_eq!(parse_decimal_literal("-", 2), Err(LiteralError::Malformed));
        assert_eq!(parse_decimal_literal("1.2.3", 2), Err(LiteralError::Malformed));
        assert_eq!(parse_decimal_literal("abc", 2), Err(LiteralError::Malformed));
        assert_eq!(parse_decimal_literal("1e", 2), Err(LiteralError::Malformed));
        assert_eq!(parse_decimal_literal("1e40", 2), Err(LiteralError::OutOfRange));
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(float_to_i128(2.5), Some(3));
        assert_eq!(float_to_i128(-2.5), Some(-3));
        assert_eq!(float_to_i128(f64::NAN), None);
        assert_eq!(float_to_i128(1e40), None);
        assert_eq!(float_to_u128(-1.0), None);
        assert_eq!(float_to_decimal(1.23, 2), Some(123));
    }
}
