//! Duration parsing with unit inference.
//!
//! Units are detected by substring search on the lowercased text, in a fixed
//! precedence order: hours, minutes, seconds, days. Text without any unit
//! keyword is taken to be in minutes.

use super::numeric::extract_number_or_range;
use serde::{Deserialize, Serialize};

const HOUR_KEYWORDS: [&str; 6] = ["saat", " hour", " hours", " hrs", " hr", " h "];
const MINUTE_KEYWORDS: [&str; 5] = ["dk", "dakika", " min", "mins", "minute"];
const SECOND_KEYWORDS: [&str; 4] = ["sn", "saniye", " sec", "second"];
const DAY_KEYWORDS: [&str; 2] = ["gün", " day"];

/// A duration unit recognized in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Hours,
    Minutes,
    Seconds,
    Days,
}

impl DurationUnit {
    /// Units in detection precedence order.
    pub const PRECEDENCE: [DurationUnit; 4] = [
        DurationUnit::Hours,
        DurationUnit::Minutes,
        DurationUnit::Seconds,
        DurationUnit::Days,
    ];

    /// Substrings that indicate this unit.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Hours => &HOUR_KEYWORDS,
            Self::Minutes => &MINUTE_KEYWORDS,
            Self::Seconds => &SECOND_KEYWORDS,
            Self::Days => &DAY_KEYWORDS,
        }
    }

    /// How many minutes one unit spans.
    pub fn minutes_factor(self) -> f64 {
        match self {
            Self::Hours => 60.0,
            Self::Minutes => 1.0,
            Self::Seconds => 1.0 / 60.0,
            Self::Days => 1440.0,
        }
    }

    /// Convert a value in this unit to minutes.
    pub fn to_minutes(self, value: f64) -> f64 {
        match self {
            Self::Hours => value * 60.0,
            Self::Minutes => value,
            Self::Seconds => value / 60.0,
            Self::Days => value * 24.0 * 60.0,
        }
    }

    /// Detect the unit mentioned in already-lowercased text.
    ///
    /// The first unit in [`Self::PRECEDENCE`] with a matching keyword wins.
    pub fn detect(lowered: &str) -> Option<DurationUnit> {
        Self::PRECEDENCE
            .into_iter()
            .find(|unit| unit.keywords().iter().any(|kw| lowered.contains(kw)))
    }
}

/// Parse a duration such as `"2 saat"`, `"30 dk"` or `"90 sn"` into minutes.
///
/// Returns `None` when no number can be extracted or the result does not fit
/// a finite `f64`. A missing unit means the value is already in minutes.
pub fn parse_duration_minutes(value: &str) -> Option<f64> {
    let lowered = value.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let number = extract_number_or_range(&lowered)?;
    let minutes = match DurationUnit::detect(&lowered) {
        Some(unit) => unit.to_minutes(number),
        None => number,
    };

    Some(minutes).filter(|m| m.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_units() {
        assert_eq!(parse_duration_minutes("2 saat"), Some(120.0));
        assert_eq!(parse_duration_minutes("30 dk"), Some(30.0));
        assert_eq!(parse_duration_minutes("20 Dakika"), Some(20.0));
        assert_eq!(parse_duration_minutes("90 sn"), Some(1.5));
        assert_eq!(parse_duration_minutes("1 gün"), Some(1440.0));
        assert_eq!(parse_duration_minutes("1 GÜN"), Some(1440.0));
    }

    #[test]
    fn test_english_units() {
        assert_eq!(parse_duration_minutes("1.5 hours"), Some(90.0));
        assert_eq!(parse_duration_minutes("45 mins"), Some(45.0));
        assert_eq!(parse_duration_minutes("30 seconds"), Some(0.5));
        assert_eq!(parse_duration_minutes("2 days"), Some(2880.0));
    }

    #[test]
    fn test_missing_unit_defaults_to_minutes() {
        assert_eq!(parse_duration_minutes("45"), Some(45.0));
        assert_eq!(parse_duration_minutes("10-20"), Some(15.0));
    }

    #[test]
    fn test_ranges_and_decimal_commas() {
        assert_eq!(parse_duration_minutes("1-2 saat"), Some(90.0));
        assert_eq!(parse_duration_minutes("0,5 saat"), Some(30.0));
    }

    #[test]
    fn test_unparseable_durations() {
        assert_eq!(parse_duration_minutes(""), None);
        assert_eq!(parse_duration_minutes("  "), None);
        assert_eq!(parse_duration_minutes("dakika"), None);
    }

    #[test]
    fn test_overflowing_duration_is_none() {
        let huge = format!("1{} gün", "0".repeat(306));
        assert_eq!(parse_duration_minutes(&huge), None);
        let huge_minutes = format!("1{}", "0".repeat(306));
        assert_eq!(parse_duration_minutes(&huge_minutes), Some(1e306));
    }

    #[test]
    fn test_hour_keyword_precedes_minute_keyword() {
        // Both "saat" and "dk" appear; hours are checked first.
        assert_eq!(parse_duration_minutes("1 saat 30 dk"), Some(60.0));
    }

    #[test]
    fn test_detect_precedence() {
        assert_eq!(DurationUnit::detect("3 saniye"), Some(DurationUnit::Seconds));
        assert_eq!(DurationUnit::detect("5 gün 2 dk"), Some(DurationUnit::Minutes));
        assert_eq!(DurationUnit::detect("45"), None);
    }

    #[test]
    fn test_minutes_factor() {
        assert_eq!(DurationUnit::Hours.minutes_factor(), 60.0);
        assert_eq!(DurationUnit::Days.minutes_factor(), 1440.0);
        assert_eq!(DurationUnit::Minutes.to_minutes(12.5), 12.5);
    }
}
