//! Numeric extraction from free text.

use once_cell::sync::Lazy;
use regex::Regex;

// Two numbers joined by a hyphen or en-dash, e.g. "8-10", "2,5 – 3".
static RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*[-–]\s*([0-9]+(?:[.,][0-9]+)?)")
        .expect("Invalid regex: numeric range")
});

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?)([0-9]+(?:[.,][0-9]+)?)").expect("Invalid regex: number")
});

/// Parse a number that may use a decimal comma.
fn to_float(number: &str) -> Option<f64> {
    number
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Extract a single number from free text.
///
/// A range like `"8-10"` yields its mean (`9.0`); otherwise the first number
/// is returned. Decimal commas are accepted (`"3,5"` → `3.5`). A leading minus
/// sign counts only when it starts the text or follows whitespace.
///
/// Returns `None` when no number can be found.
pub fn extract_number_or_range(value: &str) -> Option<f64> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = RANGE_PATTERN.captures(text)
        && let (Some(low), Some(high)) = (to_float(&caps[1]), to_float(&caps[2]))
    {
        return Some((low + high) / 2.0);
    }

    let caps = NUMBER_PATTERN.captures(text)?;
    let magnitude = to_float(&caps[2])?;

    let sign = caps.get(1).filter(|m| !m.as_str().is_empty());
    let negative = sign.is_some_and(|m| {
        text[..m.start()]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace)
    });

    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a session count such as `"10 seans"`, `"8-10"` or `"12"`.
///
/// Negative results are discarded.
pub fn parse_sessions(value: &str) -> Option<f64> {
    extract_number_or_range(value).filter(|n| *n >= 0.0)
}

/// Round a parsed value to the nearest integer, halves to even.
///
/// `"10-15"` averages to 12.5 and becomes 12; `"8-9"` becomes 8.
pub fn to_int_safe(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
        .map(|v| v.round_ties_even() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(extract_number_or_range("15"), Some(15.0));
        assert_eq!(extract_number_or_range("15 Seans"), Some(15.0));
        assert_eq!(extract_number_or_range("  2.5 "), Some(2.5));
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(extract_number_or_range("3,5"), Some(3.5));
        assert_eq!(extract_number_or_range("yaklaşık 0,25 saat"), Some(0.25));
    }

    #[test]
    fn test_range_returns_mean() {
        assert_eq!(extract_number_or_range("8-10"), Some(9.0));
        assert_eq!(extract_number_or_range("8 - 10 seans"), Some(9.0));
        assert_eq!(extract_number_or_range("2,5–3,5"), Some(3.0));
    }

    #[test]
    fn test_range_takes_precedence_over_first_number() {
        // The first standalone number would be 1, but the range wins.
        assert_eq!(extract_number_or_range("Kür 1: 10-20"), Some(15.0));
    }

    #[test]
    fn test_unparseable_inputs() {
        assert_eq!(extract_number_or_range(""), None);
        assert_eq!(extract_number_or_range("   "), None);
        assert_eq!(extract_number_or_range("bilinmiyor"), None);
        assert_eq!(extract_number_or_range("-"), None);
    }

    #[test]
    fn test_sign_handling() {
        assert_eq!(extract_number_or_range("-5"), Some(-5.0));
        assert_eq!(extract_number_or_range("seans -5"), Some(-5.0));
        assert_eq!(extract_number_or_range("abc-5"), Some(5.0));
    }

    #[test]
    fn test_parse_sessions_rejects_negative() {
        assert_eq!(parse_sessions("-5"), None);
        assert_eq!(parse_sessions("15 Seans"), Some(15.0));
        assert_eq!(parse_sessions("0"), Some(0.0));
    }

    #[test]
    fn test_to_int_safe() {
        assert_eq!(to_int_safe(Some(9.0)), Some(9));
        assert_eq!(to_int_safe(Some(9.4)), Some(9));
        assert_eq!(to_int_safe(Some(9.6)), Some(10));
        assert_eq!(to_int_safe(None), None);
        assert_eq!(to_int_safe(Some(f64::NAN)), None);
    }

    #[test]
    fn test_to_int_safe_rounds_halves_to_even() {
        assert_eq!(to_int_safe(Some(12.5)), Some(12));
        assert_eq!(to_int_safe(Some(13.5)), Some(14));
        assert_eq!(to_int_safe(Some(0.5)), Some(0));
        assert_eq!(to_int_safe(parse_sessions("10-15 seans")), Some(12));
        assert_eq!(to_int_safe(parse_sessions("8-9")), Some(8));
    }
}
