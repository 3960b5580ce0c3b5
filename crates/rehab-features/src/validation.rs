//! Schema and data sanity checks on the raw input.
//!
//! The validator never modifies the frame. It reports what it finds; only a
//! missing required column or a row count mismatch make
//! [`ValidationReport::ensure_passed`] fail. Column order differences and
//! duplicates are reported as warnings.

use crate::config::PipelineConfig;
use crate::error::{FeatureError, Result};
use crate::utils::{column_names, duplicate_count, float_column, has_column, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Missing value count of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValues {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

/// Basic range statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSanity {
    pub column: String,
    pub non_null: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub negatives: usize,
    pub zeros: usize,
}

impl NumericSanity {
    fn from_column(column: &str, values: &Float64Chunked) -> Self {
        Self {
            column: column.to_string(),
            non_null: values.len() - values.null_count(),
            min: values.min(),
            max: values.max(),
            negatives: values.lt(0.0).sum().unwrap_or(0) as usize,
            zeros: values.equal(0.0).sum().unwrap_or(0) as usize,
        }
    }
}

/// Result of [`DatasetValidator::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows: usize,
    pub columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_rows: Option<usize>,
    pub shape_ok: bool,
    pub column_set_ok: bool,
    pub column_order_ok: bool,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub duplicate_rows: usize,
    pub id_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_duplicates: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_unique: Option<usize>,
    /// Sorted by count, highest first.
    pub missing_values: Vec<MissingValues>,
    pub numeric_sanity: Vec<NumericSanity>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Whether the input can be processed.
    pub fn passed(&self) -> bool {
        self.shape_ok && self.missing_columns.is_empty()
    }

    /// Fail with [`FeatureError::SchemaMismatch`] unless [`Self::passed`].
    pub fn ensure_passed(&self) -> Result<()> {
        if !self.missing_columns.is_empty() {
            return Err(FeatureError::SchemaMismatch(format!(
                "missing required columns: {}",
                self.missing_columns.join(", ")
            )));
        }
        if !self.shape_ok {
            return Err(FeatureError::SchemaMismatch(format!(
                "expected {} rows, found {}",
                self.expected_rows.unwrap_or_default(),
                self.rows
            )));
        }
        Ok(())
    }
}

/// Checks a raw input frame against the pipeline configuration.
pub struct DatasetValidator;

impl DatasetValidator {
    pub fn validate(df: &DataFrame, config: &PipelineConfig) -> Result<ValidationReport> {
        info!("Validating input ({} rows, {} columns)...", df.height(), df.width());

        let actual = column_names(df);
        let mut warnings = Vec::new();

        let shape_ok = config.expected_rows.is_none_or(|n| n == df.height());

        let actual_set: HashSet<&str> = actual.iter().map(String::as_str).collect();
        let expected_set: HashSet<&str> =
            config.expected_columns.iter().map(String::as_str).collect();
        let missing_columns: Vec<String> = config
            .expected_columns
            .iter()
            .filter(|c| !actual_set.contains(c.as_str()))
            .cloned()
            .collect();
        let extra_columns: Vec<String> = actual
            .iter()
            .filter(|c| !expected_set.contains(c.as_str()))
            .cloned()
            .collect();
        let column_set_ok = missing_columns.is_empty() && extra_columns.is_empty();

        let present_in_order: Vec<&String> =
            actual.iter().filter(|c| expected_set.contains(c.as_str())).collect();
        let expected_in_order: Vec<&String> = config
            .expected_columns
            .iter()
            .filter(|c| actual_set.contains(c.as_str()))
            .collect();
        let column_order_ok = present_in_order == expected_in_order;

        if !missing_columns.is_empty() {
            warn!("Missing columns: {:?}", missing_columns);
        }
        if !extra_columns.is_empty() {
            warnings.push(format!("Unexpected columns: {}", extra_columns.join(", ")));
        }
        if !column_order_ok {
            warnings.push("Column order differs from the expected layout".to_string());
        }
        if !shape_ok {
            warn!(
                "Row count {} does not match expected {:?}",
                df.height(),
                config.expected_rows
            );
        }

        let duplicate_rows = duplicate_count(df, None)?;
        if duplicate_rows > 0 {
            warnings.push(format!("{} fully duplicated rows", duplicate_rows));
        }

        let (id_duplicates, id_unique) = if has_column(df, &config.id_column) {
            let subset = [config.id_column.clone()];
            let duplicates = duplicate_count(df, Some(&subset))?;
            if duplicates > 0 {
                warnings.push(format!(
                    "{} rows repeat an earlier '{}'",
                    duplicates, config.id_column
                ));
            }
            (Some(duplicates), Some(df.height() - duplicates))
        } else {
            (None, None)
        };

        let height = df.height().max(1) as f64;
        let mut missing_values: Vec<MissingValues> = df
            .get_columns()
            .iter()
            .map(|column| MissingValues {
                column: column.name().to_string(),
                count: column.null_count(),
                percentage: column.null_count() as f64 / height * 100.0,
            })
            .collect();
        missing_values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.column.cmp(&b.column)));

        let mut numeric_sanity = Vec::new();
        for column in df.get_columns() {
            if is_numeric_dtype(column.dtype()) {
                let name = column.name().as_str();
                numeric_sanity.push(NumericSanity::from_column(name, &float_column(df, name)?));
            }
        }
        for sanity in numeric_sanity.iter().filter(|s| s.negatives > 0) {
            warnings.push(format!(
                "'{}' has {} negative values",
                sanity.column, sanity.negatives
            ));
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        let report = ValidationReport {
            rows: df.height(),
            columns: df.width(),
            expected_rows: config.expected_rows,
            shape_ok,
            column_set_ok,
            column_order_ok,
            missing_columns,
            extra_columns,
            duplicate_rows,
            id_column: config.id_column.clone(),
            id_duplicates,
            id_unique,
            missing_values,
            numeric_sanity,
            warnings,
        };

        info!(
            "Validation {}: {} duplicate rows, {} warnings",
            if report.passed() { "passed" } else { "failed" },
            report.duplicate_rows,
            report.warnings.len()
        );

        Ok(report)
    }
}
