//! Configuration types for the feature pipeline.
//!
//! Every path and column name the pipeline touches lives here and is passed in
//! explicitly; nothing is read from process-wide constants. Defaults describe
//! the rehabilitation clinic dataset.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Columns of the raw clinic export, in their documented order.
pub const DEFAULT_EXPECTED_COLUMNS: [&str; 13] = [
    "HastaNo",
    "Yas",
    "Cinsiyet",
    "KanGrubu",
    "Uyruk",
    "KronikHastalik",
    "Bolum",
    "Alerji",
    "Tanilar",
    "TedaviAdi",
    "TedaviSuresi",
    "UygulamaYerleri",
    "UygulamaSuresi",
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Configuration for the feature pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a configuration with the
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use rehab_features::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .output_dir("outputs")
///     .expected_rows(2235)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Patient identifier column. Must be unique after deduplication.
    /// Default: "HastaNo"
    pub id_column: String,

    /// Free-text session count column.
    /// Default: "TedaviSuresi"
    pub session_column: String,

    /// Derived integer session count column; also the regression target.
    /// Default: "TedaviSuresi_num"
    pub session_output_column: String,

    /// Free-text application duration column.
    /// Default: "UygulamaSuresi"
    pub duration_column: String,

    /// Derived duration column in minutes.
    /// Default: "UygulamaSuresi_min"
    pub duration_output_column: String,

    /// Numeric feature columns (median imputed, standard scaled).
    pub numeric_columns: Vec<String>,

    /// Categorical feature columns (mode imputed, one-hot encoded).
    pub categorical_columns: Vec<String>,

    /// Multi-value text columns (multi-hot encoded).
    pub multilabel_columns: Vec<String>,

    /// Column set the raw input must contain.
    pub expected_columns: Vec<String>,

    /// Exact row count the raw input must have, if known.
    /// Default: None (not checked)
    pub expected_rows: Option<usize>,

    /// Output directory for the feature table and fitted state.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Output file stem for the feature table.
    /// Default: "dataset_model_ready"
    pub output_name: String,

    /// Whether to write artifacts to disk.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id_column: "HastaNo".to_string(),
            session_column: "TedaviSuresi".to_string(),
            session_output_column: "TedaviSuresi_num".to_string(),
            duration_column: "UygulamaSuresi".to_string(),
            duration_output_column: "UygulamaSuresi_min".to_string(),
            numeric_columns: strings(&["Yas", "UygulamaSuresi_min"]),
            categorical_columns: strings(&["Cinsiyet", "KanGrubu", "Uyruk", "Bolum", "TedaviAdi"]),
            multilabel_columns: strings(&["KronikHastalik", "Alerji", "UygulamaYerleri"]),
            expected_columns: strings(&DEFAULT_EXPECTED_COLUMNS),
            expected_rows: None,
            output_dir: PathBuf::from("outputs"),
            output_name: "dataset_model_ready".to_string(),
            save_to_disk: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// The regression target column (the derived session count).
    pub fn target_column(&self) -> &str {
        &self.session_output_column
    }

    /// All feature input columns in block order: numeric, categorical, multi-label.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.numeric_columns
            .iter()
            .chain(&self.categorical_columns)
            .chain(&self.multilabel_columns)
            .map(String::as_str)
            .collect()
    }

    /// Path of the assembled feature table with the given extension.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_name, extension))
    }

    /// Path of the feature name listing.
    pub fn feature_names_path(&self) -> PathBuf {
        self.output_dir.join("feature_names.txt")
    }

    /// Path of the serialized fitted state.
    pub fn state_path(&self) -> PathBuf {
        self.output_dir.join("preprocess_state.json")
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let named = [
            ("id_column", &self.id_column),
            ("session_column", &self.session_column),
            ("session_output_column", &self.session_output_column),
            ("duration_column", &self.duration_column),
            ("duration_output_column", &self.duration_output_column),
            ("output_name", &self.output_name),
        ];
        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyName(field.to_string()));
            }
        }

        let mut seen = HashSet::new();
        for column in self.feature_columns() {
            if column.trim().is_empty() {
                return Err(ConfigValidationError::EmptyName("feature column".to_string()));
            }
            if !seen.insert(column) {
                return Err(ConfigValidationError::DuplicateFeatureColumn(
                    column.to_string(),
                ));
            }
        }

        if seen.contains(self.id_column.as_str()) || seen.contains(self.target_column()) {
            return Err(ConfigValidationError::FeatureOverlapsKey(
                self.id_column.clone(),
                self.target_column().to_string(),
            ));
        }

        if self.expected_rows == Some(0) {
            return Err(ConfigValidationError::InvalidExpectedRows);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Configuration field '{0}' must not be empty")]
    EmptyName(String),

    #[error("Column '{0}' is listed in more than one feature group")]
    DuplicateFeatureColumn(String),

    #[error("Feature columns must not include the identifier '{0}' or the target '{1}'")]
    FeatureOverlapsKey(String, String),

    #[error("Expected row count must be at least 1")]
    InvalidExpectedRows,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    id_column: Option<String>,
    session_column: Option<String>,
    session_output_column: Option<String>,
    duration_column: Option<String>,
    duration_output_column: Option<String>,
    numeric_columns: Option<Vec<String>>,
    categorical_columns: Option<Vec<String>>,
    multilabel_columns: Option<Vec<String>>,
    expected_columns: Option<Vec<String>>,
    expected_rows: Option<usize>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the patient identifier column.
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    /// Set the free-text session column and the derived target column.
    pub fn session_columns(mut self, source: impl Into<String>, derived: impl Into<String>) -> Self {
        self.session_column = Some(source.into());
        self.session_output_column = Some(derived.into());
        self
    }

    /// Set the free-text duration column and the derived minutes column.
    pub fn duration_columns(
        mut self,
        source: impl Into<String>,
        derived: impl Into<String>,
    ) -> Self {
        self.duration_column = Some(source.into());
        self.duration_output_column = Some(derived.into());
        self
    }

    /// Set the numeric feature columns.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the categorical feature columns.
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the multi-value text columns.
    pub fn multilabel_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multilabel_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the column set the raw input must contain.
    pub fn expected_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Require an exact row count in the raw input.
    pub fn expected_rows(mut self, rows: usize) -> Self {
        self.expected_rows = Some(rows);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the output file stem (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable writing artifacts to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            id_column: self.id_column.unwrap_or(defaults.id_column),
            session_column: self.session_column.unwrap_or(defaults.session_column),
            session_output_column: self
                .session_output_column
                .unwrap_or(defaults.session_output_column),
            duration_column: self.duration_column.unwrap_or(defaults.duration_column),
            duration_output_column: self
                .duration_output_column
                .unwrap_or(defaults.duration_output_column),
            numeric_columns: self.numeric_columns.unwrap_or(defaults.numeric_columns),
            categorical_columns: self
                .categorical_columns
                .unwrap_or(defaults.categorical_columns),
            multilabel_columns: self
                .multilabel_columns
                .unwrap_or(defaults.multilabel_columns),
            expected_columns: self.expected_columns.unwrap_or(defaults.expected_columns),
            expected_rows: self.expected_rows,
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name.unwrap_or(defaults.output_name),
            save_to_disk: self.save_to_disk.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
