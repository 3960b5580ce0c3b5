//! Feature encoders.
//!
//! Each encoder is fitted once and produces a serializable, read-only state
//! that can transform any number of frames:
//!
//! - [`NumericScaler`]: median imputation and standard scaling
//! - [`CategoricalEncoder`]: most-frequent imputation and one-hot encoding
//! - [`MultiLabelEncoder`]: multi-hot encoding of delimiter-separated text

pub mod multilabel;
pub mod onehot;
pub mod scaler;

pub use multilabel::{ColumnVocabulary, EncoderState, FeatureSlot, MultiHotMatrix, MultiLabelEncoder};
pub use onehot::{CATEGORICAL_PREFIX, CategoricalEncoder, CategoryLevels};
pub use scaler::{NUMERIC_PREFIX, NumericScaler, NumericStats};

/// Output name prefix of the multi-label block.
pub const MULTILABEL_PREFIX: &str = "mlb__";
