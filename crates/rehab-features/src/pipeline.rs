//! End-to-end run: validate, derive, fit (or reuse a state), assemble, persist.

use crate::assembler::{AssembledFeatures, AssemblerState, DedupCounts, deduplicate};
use crate::config::PipelineConfig;
use crate::derive::{DerivedReport, derive_numeric_columns};
use crate::error::{Result, ResultExt};
use crate::io::write_artifacts;
use crate::report::{BlockWidths, RunMode, RunReport};
use crate::validation::{DatasetValidator, ValidationReport};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Result of [`FeaturePipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: AssembledFeatures,
    pub state: AssemblerState,
    pub report: RunReport,
}

/// Vocabulary size of one multi-label column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySize {
    pub column: String,
    pub tokens: usize,
}

/// What a run would produce, computed without writing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunReport {
    pub validation: ValidationReport,
    pub derived: DerivedReport,
    pub dedup: DedupCounts,
    pub block_widths: BlockWidths,
    pub vocabulary_sizes: Vec<VocabularySize>,
}

/// Orchestrates one feature-building run over an in-memory table.
///
/// # Example
///
/// ```rust,ignore
/// use rehab_features::{FeaturePipeline, PipelineConfig};
///
/// let output = FeaturePipeline::new(PipelineConfig::default())?.run(&raw)?;
/// println!("{} features", output.features.feature_count());
/// ```
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    state: Option<AssemblerState>,
}

static_assertions::assert_impl_all!(FeaturePipeline: Send);

impl FeaturePipeline {
    /// Create a pipeline that fits a fresh state on every run.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Transform with a previously fitted state instead of fitting.
    pub fn with_state(mut self, state: AssemblerState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline. Artifacts are written only when
    /// [`PipelineConfig::save_to_disk`] is set and every check passed.
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineOutput> {
        match self.run_internal(raw) {
            Ok(output) => Ok(output),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self, raw: &DataFrame) -> Result<PipelineOutput> {
        let start = Instant::now();
        info!("Starting feature pipeline...");

        info!("Step 1: Validating input...");
        let validation = DatasetValidator::validate(raw, &self.config)?;
        validation.ensure_passed()?;

        info!("Step 2: Deriving numeric columns...");
        let (derived_df, derived) = derive_numeric_columns(raw, &self.config)?;

        let (state, mode) = match &self.state {
            Some(state) => {
                info!("Step 3: Using provided fitted state");
                (state.clone(), RunMode::Transform)
            }
            None => {
                info!("Step 3: Fitting feature blocks...");
                (AssemblerState::fit(&derived_df, &self.config)?, RunMode::Fit)
            }
        };

        info!("Step 4: Assembling feature table...");
        let mut features = state
            .transform(&derived_df)
            .context("Assembling feature table")?;

        let artifacts = if self.config.save_to_disk {
            info!("Step 5: Writing artifacts...");
            Some(write_artifacts(&mut features, Some(&state), &self.config)?)
        } else {
            None
        };

        let report = RunReport {
            generated_at: RunReport::timestamp(),
            input_file: None,
            mode,
            duration_ms: start.elapsed().as_millis() as u64,
            validation,
            derived,
            dedup: features.dedup,
            rows_out: features.frame.height(),
            columns_out: features.frame.width(),
            feature_count: features.feature_count(),
            block_widths: block_widths(&state),
            dropped_collisions: state
                .multilabel
                .dropped_collisions()
                .iter()
                .map(|slot| slot.name.clone())
                .collect(),
            artifacts,
        };

        info!(
            "Pipeline completed: {} rows, {} features in {}ms",
            report.rows_out, report.feature_count, report.duration_ms
        );

        Ok(PipelineOutput {
            features,
            state,
            report,
        })
    }

    /// Validate, derive and fit without assembling or writing anything.
    pub fn dry_run(&self, raw: &DataFrame) -> Result<DryRunReport> {
        let validation = DatasetValidator::validate(raw, &self.config)?;
        validation.ensure_passed()?;

        let (derived_df, derived) = derive_numeric_columns(raw, &self.config)?;
        let (_, dedup) = deduplicate(&derived_df, &self.config.id_column)?;
        let state = match &self.state {
            Some(state) => state.clone(),
            None => AssemblerState::fit(&derived_df, &self.config)?,
        };

        let vocabulary_sizes = state
            .multilabel
            .vocabularies()
            .iter()
            .map(|v| VocabularySize {
                column: v.column.clone(),
                tokens: v.tokens.len(),
            })
            .collect();

        Ok(DryRunReport {
            validation,
            derived,
            dedup,
            block_widths: block_widths(&state),
            vocabulary_sizes,
        })
    }
}

fn block_widths(state: &AssemblerState) -> BlockWidths {
    BlockWidths {
        numeric: state.numeric.feature_names().len(),
        categorical: state.categorical.feature_names().len(),
        multilabel: state.multilabel.width(),
    }
}
