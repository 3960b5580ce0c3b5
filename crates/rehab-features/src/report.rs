//! Machine-readable summary of a pipeline run.

use crate::assembler::DedupCounts;
use crate::derive::DerivedReport;
use crate::error::{Result, ResultExt};
use crate::io::ArtifactPaths;
use crate::validation::ValidationReport;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Whether the fitted state was learned in this run or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Fit,
    Transform,
}

/// Output width of each feature block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockWidths {
    pub numeric: usize,
    pub categorical: usize,
    pub multilabel: usize,
}

impl BlockWidths {
    pub fn total(&self) -> usize {
        self.numeric + self.categorical + self.multilabel
    }
}

/// Everything a run did, serialized for `--json` and `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Local time the report was generated.
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    pub mode: RunMode,
    pub duration_ms: u64,
    pub validation: ValidationReport,
    pub derived: DerivedReport,
    pub dedup: DedupCounts,
    pub rows_out: usize,
    pub columns_out: usize,
    pub feature_count: usize,
    pub block_widths: BlockWidths,
    /// Multi-label feature names that were dropped as name collisions.
    pub dropped_collisions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactPaths>,
}

impl RunReport {
    pub(crate) fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Write the report as `<base_name>_report.json` under `output_dir`.
    pub fn write_to_file(&self, output_dir: &Path, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(output_dir).context(format!("Creating {}", output_dir.display()))?;

        let path = output_dir.join(format!("{}_report.json", base_name));
        crate::io::write_json(self, &path)?;

        info!("Report saved: {}", path.display());
        Ok(path)
    }
}
