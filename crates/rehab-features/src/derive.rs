//! Derivation of numeric columns from free-text fields.
//!
//! Adds the integer session count (the regression target) and the application
//! duration in minutes. Negative results are nulled in both columns.

use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::parsing::{extract_number_or_range, parse_duration_minutes, parse_sessions, to_int_safe};
use crate::utils::string_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fill statistics of one derived column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumnSummary {
    pub source: String,
    pub column: String,
    pub non_null: usize,
    pub total: usize,
    /// Values that parsed but were negative and therefore nulled.
    pub negatives_nulled: usize,
}

impl DerivedColumnSummary {
    pub fn fill_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.non_null as f64 / self.total as f64
        }
    }
}

/// Summary of [`derive_numeric_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedReport {
    pub sessions: DerivedColumnSummary,
    pub duration: DerivedColumnSummary,
}

/// Parse the session and duration text columns into numeric columns.
///
/// Returns a copy of `df` with the two derived columns added (or replaced).
///
/// # Errors
///
/// Returns [`crate::FeatureError::ColumnNotFound`] if a source column is
/// missing.
pub fn derive_numeric_columns(
    df: &DataFrame,
    config: &PipelineConfig,
) -> Result<(DataFrame, DerivedReport)> {
    info!("Deriving numeric columns...");
    let total = df.height();

    let session_text = string_values(df, &config.session_column)?;
    let mut session_negatives = 0;
    let sessions: Vec<Option<i64>> = session_text
        .iter()
        .map(|cell| {
            let text = cell.as_deref()?;
            let parsed = parse_sessions(text);
            if parsed.is_none() && extract_number_or_range(text).is_some() {
                session_negatives += 1;
            }
            to_int_safe(parsed)
        })
        .collect();

    let duration_text = string_values(df, &config.duration_column)?;
    let mut duration_negatives = 0;
    let durations: Vec<Option<f64>> = duration_text
        .iter()
        .map(|cell| {
            let minutes = parse_duration_minutes(cell.as_deref()?)?;
            if minutes < 0.0 {
                duration_negatives += 1;
                None
            } else {
                Some(minutes)
            }
        })
        .collect();

    let report = DerivedReport {
        sessions: DerivedColumnSummary {
            source: config.session_column.clone(),
            column: config.session_output_column.clone(),
            non_null: sessions.iter().flatten().count(),
            total,
            negatives_nulled: session_negatives,
        },
        duration: DerivedColumnSummary {
            source: config.duration_column.clone(),
            column: config.duration_output_column.clone(),
            non_null: durations.iter().flatten().count(),
            total,
            negatives_nulled: duration_negatives,
        },
    };

    let mut out = df.clone();
    out.with_column(Series::new(
        config.session_output_column.as_str().into(),
        sessions,
    ))
    .context("Adding derived session column")?;
    out.with_column(Series::new(
        config.duration_output_column.as_str().into(),
        durations,
    ))
    .context("Adding derived duration column")?;

    for summary in [&report.sessions, &report.duration] {
        info!(
            "{} non-null: {}/{}",
            summary.column, summary.non_null, summary.total
        );
        if summary.negatives_nulled > 0 {
            debug!(
                "{}: {} negative values set to null",
                summary.column, summary.negatives_nulled
            );
        }
    }

    Ok((out, report))
}
