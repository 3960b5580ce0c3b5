//! Assembly of the model-ready feature table.
//!
//! The input is deduplicated (exact rows first, then by identifier, keeping
//! the first occurrence each time), then three fitted blocks are laid out
//! after the identifier and the target:
//!
//! ```text
//! [HastaNo, TedaviSuresi_num, num__…, cat__…, mlb__…]
//! ```
//!
//! The output is checked before it is returned: column names must be unique
//! and every identifier must occur once. A failed check is a hard error.

use crate::config::PipelineConfig;
use crate::encoding::{CategoricalEncoder, EncoderState, MULTILABEL_PREFIX, NumericScaler};
use crate::error::{FeatureError, Result, ResultExt};
use crate::utils::{drop_duplicates, duplicate_count, has_column};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Row counts through the two deduplication passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DedupCounts {
    pub rows_before: usize,
    pub exact_duplicates: usize,
    pub id_duplicates: usize,
    pub rows_after: usize,
}

/// Drop exact duplicate rows, then rows repeating an earlier identifier.
///
/// The identifier pass is skipped when the column is absent.
pub fn deduplicate(df: &DataFrame, id_column: &str) -> Result<(DataFrame, DedupCounts)> {
    let rows_before = df.height();
    let exact = drop_duplicates(df, None).context("Dropping exact duplicate rows")?;
    let after_exact = exact.height();

    let deduped = if has_column(&exact, id_column) {
        let subset = [id_column.to_string()];
        drop_duplicates(&exact, Some(&subset))
            .context(format!("Dropping duplicate '{}' rows", id_column))?
    } else {
        exact
    };

    let counts = DedupCounts {
        rows_before,
        exact_duplicates: rows_before - after_exact,
        id_duplicates: after_exact - deduped.height(),
        rows_after: deduped.height(),
    };
    debug!(
        "Dedup: {} -> {} rows ({} exact, {} by '{}')",
        counts.rows_before, counts.rows_after, counts.exact_duplicates, counts.id_duplicates, id_column
    );

    Ok((deduped, counts))
}

/// Verify the assembled table before it is handed out.
///
/// `names` are the output column names in order; `frame` is checked for
/// identifier uniqueness.
pub fn check_invariants(names: &[String], frame: &DataFrame, id_column: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    let duplicated: Vec<&str> = names
        .iter()
        .filter(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
        .collect();
    if !duplicated.is_empty() {
        return Err(FeatureError::InvariantViolation(format!(
            "duplicate column names in feature table: {}",
            duplicated.join(", ")
        )));
    }

    if has_column(frame, id_column) {
        let subset = [id_column.to_string()];
        let repeated = duplicate_count(frame, Some(&subset))?;
        if repeated > 0 {
            return Err(FeatureError::InvariantViolation(format!(
                "{} duplicate '{}' values remained after deduplication",
                repeated, id_column
            )));
        }
    }

    Ok(())
}

/// Fitted state of every feature block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblerState {
    pub id_column: String,
    pub target_column: String,
    pub numeric: NumericScaler,
    pub categorical: CategoricalEncoder,
    pub multilabel: EncoderState,
}

static_assertions::assert_impl_all!(AssemblerState: Send, Sync);

impl AssemblerState {
    /// Deduplicate `df` and fit all blocks on the result.
    pub fn fit(df: &DataFrame, config: &PipelineConfig) -> Result<Self> {
        let (deduped, _) = deduplicate(df, &config.id_column)?;
        info!("Fitting feature blocks on {} rows...", deduped.height());

        let numeric = NumericScaler::fit(&deduped, config.numeric_columns.as_slice())
            .context("Fitting numeric block")?;
        let categorical = CategoricalEncoder::fit(&deduped, config.categorical_columns.as_slice())
            .context("Fitting categorical block")?;
        let multilabel = EncoderState::fit(&deduped, config.multilabel_columns.as_slice())
            .context("Fitting multi-label block")?;

        Ok(Self {
            id_column: config.id_column.clone(),
            target_column: config.target_column().to_string(),
            numeric,
            categorical,
            multilabel,
        })
    }

    /// Output feature names (identifier and target excluded), in order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric.feature_names();
        names.extend(self.categorical.feature_names());
        names.extend(
            self.multilabel
                .feature_names()
                .into_iter()
                .map(|name| format!("{}{}", MULTILABEL_PREFIX, name)),
        );
        names
    }

    /// Deduplicate `df` and lay out the feature table.
    pub fn transform(&self, df: &DataFrame) -> Result<AssembledFeatures> {
        let (deduped, dedup) = deduplicate(df, &self.id_column)?;

        let mut columns = Vec::new();
        for key in [&self.id_column, &self.target_column] {
            let column = deduped
                .column(key)
                .map_err(|_| FeatureError::ColumnNotFound(key.clone()))?;
            columns.push(column.clone());
        }

        columns.extend(self.numeric.transform(&deduped).context("Scaling numeric block")?);
        columns.extend(
            self.categorical
                .transform(&deduped)
                .context("Encoding categorical block")?,
        );
        columns.extend(
            self.multilabel
                .transform(&deduped)
                .context("Encoding multi-label block")?
                .into_columns(MULTILABEL_PREFIX),
        );

        // Checked before DataFrame::new, which would reject duplicate names
        // with a less specific error.
        let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
        check_invariants(&names, &deduped, &self.id_column)?;

        let frame = DataFrame::new(columns).context("Building feature table")?;
        if frame.height() != dedup.rows_after {
            return Err(FeatureError::InvariantViolation(format!(
                "feature table has {} rows, expected {}",
                frame.height(),
                dedup.rows_after
            )));
        }

        let feature_names = names[2..].to_vec();
        info!(
            "Assembled {} rows x {} features",
            frame.height(),
            feature_names.len()
        );

        Ok(AssembledFeatures {
            frame,
            feature_names,
            dedup,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The assembled feature table.
#[derive(Debug, Clone)]
pub struct AssembledFeatures {
    /// `[id, target, features…]`
    pub frame: DataFrame,
    /// Feature columns only, in output order.
    pub feature_names: Vec<String>,
    pub dedup: DedupCounts,
}

impl AssembledFeatures {
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// All output column names, identifier and target included.
    pub fn column_names(&self) -> Vec<String> {
        crate::utils::column_names(&self.frame)
    }
}

/// Two-phase assembler over a [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    config: PipelineConfig,
    state: Option<AssemblerState>,
}

impl FeatureAssembler {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Use a previously fitted state.
    pub fn with_state(config: PipelineConfig, state: AssemblerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&AssemblerState> {
        self.state.as_ref()
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&AssemblerState> {
        let state = AssemblerState::fit(df, &self.config)?;
        Ok(self.state.insert(state))
    }

    pub fn transform(&self, df: &DataFrame) -> Result<AssembledFeatures> {
        self.state
            .as_ref()
            .ok_or(FeatureError::NotFitted)?
            .transform(df)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<AssembledFeatures> {
        self.fit(df)?.transform(df)
    }
}
