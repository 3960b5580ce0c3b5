//! Free-text to numeric parsing.
//!
//! - [`numeric`]: single values, ranges and decimal commas
//! - [`duration`]: durations with unit inference, normalized to minutes

pub mod duration;
pub mod numeric;

pub use duration::{DurationUnit, parse_duration_minutes};
pub use numeric::{extract_number_or_range, parse_sessions, to_int_safe};
