//! Most-frequent imputation followed by one-hot encoding.

use crate::error::Result;
use crate::utils::string_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Output name prefix of the categorical block.
pub const CATEGORICAL_PREFIX: &str = "cat__";

/// Fitted levels of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevels {
    pub column: String,
    /// Sorted categories seen at fit time, after imputation.
    pub categories: Vec<String>,
    /// Most frequent value; `None` when the column had no values at all.
    pub fill_value: Option<String>,
}

impl CategoryLevels {
    fn fit(column: &str, values: &[Option<String>]) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values.iter().flatten() {
            *counts.entry(value.as_str()).or_default() += 1;
        }

        // BTreeMap iterates in sorted order and only a strictly larger count
        // replaces the current best, so ties resolve to the smallest value.
        let mut fill_value: Option<(&str, usize)> = None;
        for (&value, &count) in &counts {
            if fill_value.is_none_or(|(_, best)| count > best) {
                fill_value = Some((value, count));
            }
        }
        let fill_value = fill_value.map(|(value, _)| value.to_string());
        if fill_value.is_none() {
            warn!("Categorical column '{}' has no values; it encodes as all zeros", column);
        }

        let categories: BTreeSet<String> = values
            .iter()
            .filter_map(|v| v.clone().or_else(|| fill_value.clone()))
            .collect();

        debug!(
            "Categories for '{}': {} (fill: {:?})",
            column,
            categories.len(),
            fill_value
        );

        Self {
            column: column.to_string(),
            categories: categories.into_iter().collect(),
            fill_value,
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| format!("{}{}_{}", CATEGORICAL_PREFIX, self.column, category))
            .collect()
    }
}

/// Fitted categorical block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    levels: Vec<CategoryLevels>,
}

impl CategoricalEncoder {
    /// Learn fill values and categories. Every column must exist.
    pub fn fit<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<Self> {
        let levels = columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                Ok(CategoryLevels::fit(column, &string_values(df, column)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[CategoryLevels] {
        &self.levels
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .flat_map(CategoryLevels::feature_names)
            .collect()
    }

    /// Produce one `UInt8` indicator column per fitted category.
    ///
    /// Categories not seen at fit time set no indicator.
    pub fn transform(&self, df: &DataFrame) -> Result<Vec<Column>> {
        let mut columns = Vec::new();

        for levels in &self.levels {
            let values: Vec<Option<String>> = string_values(df, &levels.column)?
                .into_iter()
                .map(|v| v.or_else(|| levels.fill_value.clone()))
                .collect();

            for (category, name) in levels.categories.iter().zip(levels.feature_names()) {
                let indicator: Vec<u8> = values
                    .iter()
                    .map(|v| u8::from(v.as_deref() == Some(category.as_str())))
                    .collect();
                columns.push(Series::new(name.into(), indicator).into_column());
            }
        }

        Ok(columns)
    }
}
