//! Rehabilitation Treatment Feature Library
//!
//! Turns a raw physical-therapy treatment table into a model-ready feature
//! table using Polars.
//!
//! # Overview
//!
//! - **Text normalization**: Turkish-aware folding of free-text and
//!   multi-value cells into stable tokens
//! - **Numeric parsing**: session counts and ranges such as `"8-10"` or
//!   `"15 Seans"`, durations with unit inference (`"2 saat"`, `"30 dk"`)
//! - **Encoding**: median-imputed standard scaling, most-frequent imputed
//!   one-hot encoding and multi-hot encoding with fixed vocabularies
//! - **Assembly**: deduplication, fixed column layout and integrity checks
//! - **Persistence**: Parquet/CSV feature tables and a JSON fitted state that
//!   can be reloaded to transform new data identically
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rehab_features::{FeaturePipeline, PipelineConfig, io};
//! use std::path::Path;
//!
//! let raw = io::load_table(Path::new("data/treatments.csv"))?;
//!
//! let config = PipelineConfig::builder()
//!     .output_dir("outputs")
//!     .build()?;
//!
//! let output = FeaturePipeline::new(config)?.run(&raw)?;
//! println!("{} rows, {} features", output.report.rows_out, output.report.feature_count);
//! ```
//!
//! # Reusing a fitted state
//!
//! ```rust,ignore
//! let state = io::load_state(Path::new("outputs/preprocess_state.json"))?;
//! let output = FeaturePipeline::new(config)?.with_state(state).run(&new_raw)?;
//! ```
//!
//! The multi-label encoder can also be used on its own:
//!
//! ```rust,ignore
//! use rehab_features::MultiLabelEncoder;
//!
//! let mut encoder = MultiLabelEncoder::new(["KronikHastalik", "Alerji", "UygulamaYerleri"]);
//! encoder.fit(&train)?;
//! let matrix = encoder.transform(&test)?;
//! ```

pub mod assembler;
pub mod config;
pub mod derive;
pub mod encoding;
pub mod error;
pub mod io;
pub mod parsing;
pub mod pipeline;
pub mod report;
pub mod text;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use assembler::{AssembledFeatures, AssemblerState, DedupCounts, FeatureAssembler};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use derive::{DerivedColumnSummary, DerivedReport, derive_numeric_columns};
pub use encoding::{
    CategoricalEncoder, EncoderState, FeatureSlot, MultiHotMatrix, MultiLabelEncoder,
    NumericScaler,
};
pub use error::{FeatureError, Result as FeatureResult, ResultExt};
pub use parsing::{
    DurationUnit, extract_number_or_range, parse_duration_minutes, parse_sessions, to_int_safe,
};
pub use pipeline::{DryRunReport, FeaturePipeline, PipelineOutput};
pub use report::{BlockWidths, RunMode, RunReport};
pub use text::{TokenStyle, feature_safe_name, tokenize_cell};
pub use validation::{DatasetValidator, ValidationReport};
