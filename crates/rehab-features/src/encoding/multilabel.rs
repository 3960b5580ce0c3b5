//! Multi-hot encoding of multi-value text columns.
//!
//! Fitting learns one sorted vocabulary per column and a global, ordered list
//! of feature slots `(column, token, name)`. The fitted [`EncoderState`] never
//! changes afterwards: tokens first seen at transform time are ignored, so the
//! output width is always the fit-time width.
//!
//! # Example
//!
//! ```rust,ignore
//! use rehab_features::encoding::MultiLabelEncoder;
//!
//! let mut encoder = MultiLabelEncoder::new(["KronikHastalik", "Alerji"]);
//! encoder.fit(&train)?;
//! let matrix = encoder.transform(&test)?;
//! assert_eq!(matrix.width(), encoder.state().unwrap().width());
//! ```

use crate::error::{FeatureError, Result};
use crate::text::{TokenStyle, feature_safe_name, token_set};
use crate::utils::string_values_or_empty;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Token style used for every multi-label cell.
const TOKEN_STYLE: TokenStyle = TokenStyle::Label;

/// The learned vocabulary of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnVocabulary {
    pub column: String,
    /// Sorted, deduplicated tokens.
    pub tokens: Vec<String>,
}

/// One output column: a token of a source column and its feature name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSlot {
    pub column: String,
    pub token: String,
    pub name: String,
}

impl FeatureSlot {
    fn new(column: &str, token: &str) -> Self {
        Self {
            column: column.to_string(),
            token: token.to_string(),
            name: format!("{}__{}", column, feature_safe_name(token)),
        }
    }
}

/// Fitted multi-label encoder state.
///
/// Immutable after [`EncoderState::fit`]; safe to share between threads and
/// to reuse for any number of transforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderState {
    columns: Vec<String>,
    vocabularies: Vec<ColumnVocabulary>,
    features: Vec<FeatureSlot>,
    /// Slots whose generated name repeated an earlier one and were not emitted.
    dropped_collisions: Vec<FeatureSlot>,
}

static_assertions::assert_impl_all!(EncoderState: Send, Sync);

impl EncoderState {
    /// Learn vocabularies for `columns` from `df`.
    ///
    /// A column absent from `df` is treated as empty and contributes no
    /// features.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] if `columns` is empty or
    /// contains an empty name.
    pub fn fit<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<Self> {
        if columns.is_empty() {
            return Err(FeatureError::InvalidConfig(
                "multi-label encoder needs at least one target column".to_string(),
            ));
        }
        if let Some(blank) = columns.iter().find(|c| c.as_ref().trim().is_empty()) {
            return Err(FeatureError::InvalidConfig(format!(
                "multi-label target column name must not be empty (got {:?})",
                blank.as_ref()
            )));
        }

        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let mut vocabularies = Vec::with_capacity(columns.len());
        let mut features = Vec::new();
        let mut dropped_collisions = Vec::new();
        let mut seen_names = HashSet::new();

        for column in &columns {
            let mut tokens = BTreeSet::new();
            for cell in string_values_or_empty(df, column) {
                tokens.extend(token_set(cell.as_deref(), TOKEN_STYLE));
            }
            let tokens: Vec<String> = tokens.into_iter().collect();
            debug!("Vocabulary for '{}': {} tokens", column, tokens.len());

            for token in &tokens {
                let slot = FeatureSlot::new(column, token);
                if seen_names.insert(slot.name.clone()) {
                    features.push(slot);
                } else {
                    warn!(
                        "Feature name '{}' already produced; dropping token '{}' of column '{}'",
                        slot.name, slot.token, slot.column
                    );
                    dropped_collisions.push(slot);
                }
            }

            vocabularies.push(ColumnVocabulary {
                column: column.clone(),
                tokens,
            });
        }

        info!(
            "Fitted multi-label encoder: {} columns, {} features ({} dropped as name collisions)",
            columns.len(),
            features.len(),
            dropped_collisions.len()
        );

        Ok(Self {
            columns,
            vocabularies,
            features,
            dropped_collisions,
        })
    }

    /// Target columns, in fit order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Vocabulary of a column, if it was a fit target.
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.tokens.as_slice())
    }

    /// All vocabularies, in fit order.
    pub fn vocabularies(&self) -> &[ColumnVocabulary] {
        &self.vocabularies
    }

    /// Output feature slots, in output order.
    pub fn features(&self) -> &[FeatureSlot] {
        &self.features
    }

    /// Feature names, in output order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Slots dropped at fit time because their name was already taken.
    pub fn dropped_collisions(&self) -> &[FeatureSlot] {
        &self.dropped_collisions
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.features.len()
    }

    /// Encode `df` into a 0/1 matrix over the fitted features.
    ///
    /// Each target column is tokenized once per call. Rows of a column that is
    /// absent from `df` encode as all zeros.
    pub fn transform(&self, df: &DataFrame) -> Result<MultiHotMatrix> {
        let n_rows = df.height();

        let mut tokenized: HashMap<&str, Vec<HashSet<String>>> = HashMap::new();
        for column in &self.columns {
            tokenized.entry(column.as_str()).or_insert_with(|| {
                string_values_or_empty(df, column)
                    .iter()
                    .map(|cell| token_set(cell.as_deref(), TOKEN_STYLE))
                    .collect()
            });
        }

        let columns = self
            .features
            .iter()
            .map(|slot| match tokenized.get(slot.column.as_str()) {
                Some(rows) => rows
                    .iter()
                    .map(|tokens| u8::from(tokens.contains(&slot.token)))
                    .collect(),
                None => vec![0u8; n_rows],
            })
            .collect();

        Ok(MultiHotMatrix {
            feature_names: self.features.iter().map(|f| f.name.clone()).collect(),
            n_rows,
            columns,
        })
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Column-major 0/1 matrix produced by a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiHotMatrix {
    feature_names: Vec<String>,
    n_rows: usize,
    columns: Vec<Vec<u8>>,
}

impl MultiHotMatrix {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Indicator column for a feature name.
    pub fn column(&self, name: &str) -> Option<&[u8]> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// One row's feature vector, or `None` past the last row.
    pub fn row(&self, index: usize) -> Option<Vec<u8>> {
        if index >= self.n_rows {
            return None;
        }
        Some(self.columns.iter().map(|col| col[index]).collect())
    }

    /// Names of the features set to 1 in a row, or `None` past the last row.
    pub fn active_features(&self, index: usize) -> Option<Vec<&str>> {
        if index >= self.n_rows {
            return None;
        }
        Some(
            self.feature_names
                .iter()
                .zip(&self.columns)
                .filter(|(_, col)| col[index] == 1)
                .map(|(name, _)| name.as_str())
                .collect(),
        )
    }

    /// Convert to `UInt8` polars columns, optionally prefixing each name.
    pub fn into_columns(self, prefix: &str) -> Vec<Column> {
        self.feature_names
            .into_iter()
            .zip(self.columns)
            .map(|(name, values)| {
                Series::new(format!("{}{}", prefix, name).into(), values).into_column()
            })
            .collect()
    }
}

/// Two-phase multi-label encoder: construct with target columns, `fit`, then
/// `transform` any number of times.
#[derive(Debug, Clone)]
pub struct MultiLabelEncoder {
    columns: Vec<String>,
    state: Option<EncoderState>,
}

impl MultiLabelEncoder {
    /// Create an unfitted encoder for the given target columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            state: None,
        }
    }

    /// Wrap a previously fitted (e.g. reloaded) state.
    pub fn from_state(state: EncoderState) -> Self {
        Self {
            columns: state.columns.clone(),
            state: Some(state),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The fitted state, if any.
    pub fn state(&self) -> Option<&EncoderState> {
        self.state.as_ref()
    }

    /// Fit on `df`, replacing any previous state.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&EncoderState> {
        let state = EncoderState::fit(df, self.columns.as_slice())?;
        Ok(self.state.insert(state))
    }

    /// Transform with the fitted state.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::NotFitted`] if [`Self::fit`] has not been called.
    pub fn transform(&self, df: &DataFrame) -> Result<MultiHotMatrix> {
        self.state
            .as_ref()
            .ok_or(FeatureError::NotFitted)?
            .transform(df)
    }

    /// Fit on `df` and transform it.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<MultiHotMatrix> {
        self.fit(df)?.transform(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corpus() -> DataFrame {
        df!(
            "Alerji" => &[Some("Astım, Diyabet; astim"), Some("Polen"), None, Some("  ")],
            "KronikHastalik" => &[Some("Hipertansiyon"), Some("Diyabet/Astım"), Some("Diyabet"), None],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_builds_sorted_vocabularies() {
        let state = EncoderState::fit(&corpus(), &["Alerji", "KronikHastalik"]).unwrap();

        assert_eq!(
            state.vocabulary("Alerji").unwrap(),
            &["astim", "diyabet", "polen"]
        );
        assert_eq!(
            state.vocabulary("KronikHastalik").unwrap(),
            &["astim", "diyabet", "hipertansiyon"]
        );
        assert_eq!(
            state.feature_names(),
            vec![
                "Alerji__astim",
                "Alerji__diyabet",
                "Alerji__polen",
                "KronikHastalik__astim",
                "KronikHastalik__diyabet",
                "KronikHastalik__hipertansiyon",
            ]
        );
        assert_eq!(state.width(), 6);
        assert!(state.dropped_collisions().is_empty());
    }

    #[test]
    fn test_turkish_cell_scenario() {
        let state = EncoderState::fit(&corpus(), &["Alerji"]).unwrap();
        let matrix = state.transform(&corpus()).unwrap();

        assert_eq!(
            matrix.active_features(0).unwrap(),
            vec!["Alerji__astim", "Alerji__diyabet"]
        );
        assert_eq!(matrix.column("Alerji__polen").unwrap(), &[0, 1, 0, 0]);
    }

    #[test]
    fn test_round_trip_reproduces_token_sets() {
        let df = corpus();
        let columns = ["Alerji", "KronikHastalik"];
        let state = EncoderState::fit(&df, &columns).unwrap();
        let matrix = state.transform(&df).unwrap();

        for column in columns {
            let cells = string_values_or_empty(&df, column);
            for (row, cell) in cells.iter().enumerate() {
                let expected: BTreeSet<String> = token_set(cell.as_deref(), TOKEN_STYLE)
                    .into_iter()
                    .map(|t| format!("{}__{}", column, feature_safe_name(&t)))
                    .collect();
                let prefix = format!("{}__", column);
                let active: BTreeSet<String> = matrix
                    .active_features(row)
                    .unwrap()
                    .into_iter()
                    .filter(|name| name.starts_with(&prefix))
                    .map(str::to_string)
                    .collect();
                assert_eq!(active, expected, "row {} of {}", row, column);
            }
        }
    }

    #[test]
    fn test_unseen_tokens_do_not_change_width() {
        let state = EncoderState::fit(&corpus(), &["Alerji"]).unwrap();
        let new_data = df!("Alerji" => &["Penisilin; Astım", "Lateks"]).unwrap();

        let matrix = state.transform(&new_data).unwrap();
        assert_eq!(matrix.width(), state.width());
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.row(0), Some(vec![1, 0, 0]));
        assert_eq!(matrix.row(1), Some(vec![0, 0, 0]));
        assert_eq!(state.vocabulary("Alerji").unwrap().len(), 3);
    }

    #[test]
    fn test_row_past_end_is_none() {
        let state = EncoderState::fit(&corpus(), &["Alerji"]).unwrap();
        let matrix = state.transform(&corpus()).unwrap();
        assert_eq!(matrix.n_rows(), 4);
        assert!(matrix.row(3).is_some());
        assert_eq!(matrix.row(4), None);
        assert_eq!(matrix.active_features(4), None);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let first = EncoderState::fit(&corpus(), &["KronikHastalik", "Alerji"]).unwrap();
        let second = EncoderState::fit(&corpus(), &["KronikHastalik", "Alerji"]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.feature_names(), second.feature_names());
    }

    #[test]
    fn test_missing_column_is_empty() {
        let state = EncoderState::fit(&corpus(), &["Alerji", "UygulamaYerleri"]).unwrap();
        assert_eq!(state.vocabulary("UygulamaYerleri").unwrap().len(), 0);
        assert_eq!(state.width(), 3);

        // Transform input lacking a fitted column encodes zeros for it.
        let other = df!("KronikHastalik" => &["Diyabet"]).unwrap();
        let matrix = state.transform(&other).unwrap();
        assert_eq!(matrix.row(0), Some(vec![0, 0, 0]));
    }

    #[test]
    fn test_non_text_cells_are_stringified() {
        let df = df!("Kod" => &[Some(12i64), None, Some(7)]).unwrap();
        let state = EncoderState::fit(&df, &["Kod"]).unwrap();
        assert_eq!(state.feature_names(), vec!["Kod__12", "Kod__7"]);
        let matrix = state.transform(&df).unwrap();
        assert_eq!(matrix.row(1), Some(vec![0, 0]));
    }

    #[test]
    fn test_empty_column_list_is_config_error() {
        let empty: [&str; 0] = [];
        let err = EncoderState::fit(&corpus(), &empty).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidConfig(_)));

        let err = EncoderState::fit(&corpus(), &[""]).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let encoder = MultiLabelEncoder::new(["Alerji"]);
        assert!(!encoder.is_fitted());
        assert!(matches!(
            encoder.transform(&corpus()),
            Err(FeatureError::NotFitted)
        ));
    }

    #[test]
    fn test_encoder_fit_transform_and_refit() {
        let mut encoder = MultiLabelEncoder::new(["Alerji"]);
        let matrix = encoder.fit_transform(&corpus()).unwrap();
        assert_eq!(matrix.width(), 3);

        let smaller = df!("Alerji" => &["Polen"]).unwrap();
        encoder.fit(&smaller).unwrap();
        assert_eq!(encoder.state().unwrap().width(), 1);
    }

    // Known degenerate case: two tokens that render to the same feature name
    // keep only the first slot. The second token is not encoded at all.
    #[test]
    fn test_name_collision_within_column_drops_later_token() {
        let df = df!("Alerji" => &["Tip 2", "Tip-2"]).unwrap();
        let state = EncoderState::fit(&df, &["Alerji"]).unwrap();

        assert_eq!(state.vocabulary("Alerji").unwrap(), &["tip 2", "tip-2"]);
        assert_eq!(state.feature_names(), vec!["Alerji__tip_2"]);
        assert_eq!(state.dropped_collisions().len(), 1);
        assert_eq!(state.dropped_collisions()[0].token, "tip-2");

        let matrix = state.transform(&df).unwrap();
        assert_eq!(matrix.column("Alerji__tip_2").unwrap(), &[1, 0]);
    }

    #[test]
    fn test_name_collision_across_columns_drops_duplicate() {
        let df = corpus();
        let single = EncoderState::fit(&df, &["Alerji"]).unwrap();
        let repeated = EncoderState::fit(&df, &["Alerji", "Alerji"]).unwrap();

        assert_eq!(repeated.width(), single.width());
        assert_eq!(repeated.dropped_collisions().len(), single.width());
        assert_eq!(repeated.transform(&df).unwrap(), single.transform(&df).unwrap());
    }

    #[test]
    fn test_state_json_round_trip_preserves_order() {
        let state = EncoderState::fit(&corpus(), &["KronikHastalik", "Alerji"]).unwrap();
        let reloaded = EncoderState::from_json(&state.to_json().unwrap()).unwrap();

        assert_eq!(reloaded, state);
        let encoder = MultiLabelEncoder::from_state(reloaded);
        assert_eq!(
            encoder.transform(&corpus()).unwrap(),
            state.transform(&corpus()).unwrap()
        );
    }

    #[test]
    fn test_into_columns_prefixes_names() {
        let state = EncoderState::fit(&corpus(), &["Alerji"]).unwrap();
        let columns = state.transform(&corpus()).unwrap().into_columns("mlb__");
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name().as_str(), "mlb__Alerji__astim");
        assert_eq!(columns[0].dtype(), &DataType::UInt8);
    }
}
