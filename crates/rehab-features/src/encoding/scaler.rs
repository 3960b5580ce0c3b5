//! Median imputation followed by standard scaling for numeric columns.

use crate::error::Result;
use crate::utils::float_column;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Output name prefix of the numeric block.
pub const NUMERIC_PREFIX: &str = "num__";

/// Fitted statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub column: String,
    /// Fill value for nulls.
    pub median: f64,
    /// Mean after imputation.
    pub mean: f64,
    /// Population standard deviation after imputation; 1.0 when it is zero.
    pub scale: f64,
}

impl NumericStats {
    fn fit(column: &str, values: &Float64Chunked) -> Result<Self> {
        let median = match values.median() {
            Some(m) => m,
            None => {
                warn!("Numeric column '{}' has no values; imputing 0.0", column);
                0.0
            }
        };

        let imputed = values.fill_null_with_values(median)?;
        let mean = imputed.mean().unwrap_or(median);
        let std = imputed.std(0).unwrap_or(0.0);
        let scale = if std > f64::EPSILON { std } else { 1.0 };

        debug!(
            "Scaler '{}': median={:.4}, mean={:.4}, scale={:.4}",
            column, median, mean, scale
        );

        Ok(Self {
            column: column.to_string(),
            median,
            mean,
            scale,
        })
    }

    /// Impute and scale a single value.
    pub fn apply(&self, value: Option<f64>) -> f64 {
        (value.unwrap_or(self.median) - self.mean) / self.scale
    }

    /// Impute and scale a whole column.
    pub fn apply_column(&self, values: &Float64Chunked) -> Result<Float64Chunked> {
        let imputed = values.fill_null_with_values(self.median)?;
        Ok((&imputed - self.mean) / self.scale)
    }

    pub fn feature_name(&self) -> String {
        format!("{}{}", NUMERIC_PREFIX, self.column)
    }
}

/// Fitted numeric block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    stats: Vec<NumericStats>,
}

impl NumericScaler {
    /// Learn medians and scaling statistics. Every column must exist.
    pub fn fit<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<Self> {
        let stats = columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                NumericStats::fit(column, &float_column(df, column)?)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { stats })
    }

    pub fn stats(&self) -> &[NumericStats] {
        &self.stats
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.stats.iter().map(NumericStats::feature_name).collect()
    }

    /// Produce one `Float64` column per fitted column.
    pub fn transform(&self, df: &DataFrame) -> Result<Vec<Column>> {
        self.stats
            .iter()
            .map(|stats| {
                let scaled = stats.apply_column(&float_column(df, &stats.column)?)?;
                Ok(scaled
                    .with_name(stats.feature_name().into())
                    .into_series()
                    .into_column())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;

    fn values(column: &Column) -> Vec<f64> {
        column
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_median_of_even_count_is_midpoint() {
        let df = df!("Yas" => &[Some(4.0), None, Some(1.0), Some(3.0), Some(2.0)]).unwrap();
        let scaler = NumericScaler::fit(&df, &["Yas"]).unwrap();
        assert_eq!(scaler.stats()[0].median, 2.5);
    }

    #[test]
    fn test_nan_is_imputed_like_null() {
        let df = df!("Yas" => &[Some(10.0), Some(f64::NAN), Some(20.0)]).unwrap();
        let scaler = NumericScaler::fit(&df, &["Yas"]).unwrap();
        let stats = &scaler.stats()[0];
        assert_eq!(stats.median, 15.0);
        assert_eq!(stats.mean, 15.0);
        assert_eq!(values(&scaler.transform(&df).unwrap()[0])[1], 0.0);
    }

    #[test]
    fn test_column_and_single_value_agree() {
        let df = df!("Yas" => &[Some(20.0), None, Some(45.0)]).unwrap();
        let scaler = NumericScaler::fit(&df, &["Yas"]).unwrap();
        let stats = &scaler.stats()[0];
        let scaled = values(&scaler.transform(&df).unwrap()[0]);
        for (value, expected) in [Some(20.0), None, Some(45.0)].into_iter().zip(scaled) {
            assert!((stats.apply(value) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_impute_then_scale() {
        let df = df!("Yas" => &[Some(20.0), None, Some(40.0), Some(30.0)]).unwrap();
        let scaler = NumericScaler::fit(&df, &["Yas"]).unwrap();
        let stats = &scaler.stats()[0];

        // Null filled with the median (30), so values are 20, 30, 40, 30.
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.mean, 30.0);
        assert!((stats.scale - 50.0f64.sqrt()).abs() < 1e-12);

        let columns = scaler.transform(&df).unwrap();
        assert_eq!(columns[0].name().as_str(), "num__Yas");
        let scaled = values(&columns[0]);
        assert_eq!(scaled[1], 0.0);
        assert!((scaled[0] + scaled[2]).abs() < 1e-12);
        let mean: f64 = scaled.iter().sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_uses_unit_scale() {
        let df = df!("Yas" => &[5i64, 5, 5]).unwrap();
        let scaler = NumericScaler::fit(&df, &["Yas"]).unwrap();
        assert_eq!(scaler.stats()[0].scale, 1.0);
        assert_eq!(values(&scaler.transform(&df).unwrap()[0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_all_null_column_imputes_zero() {
        let df = df!("Yas" => &[None::<f64>, None]).unwrap();
        let scaler = NumericScaler::fit(&df, &["Yas"]).unwrap();
        assert_eq!(values(&scaler.transform(&df).unwrap()[0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = df!("Yas" => &[1.0]).unwrap();
        let err = NumericScaler::fit(&df, &["Boy"]).unwrap_err();
        assert!(matches!(err, FeatureError::ColumnNotFound(_)));
    }
}
