//! Orchestrator for the prediction pipeline.
//!
//! Every stage records what it produced on the [`PredictionReport`], so a
//! failed run still shows the user everything computed up to the failure.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use bioactivity_common::config::{Config, ModelConfig, WorkspaceConfig};
use crate::descriptors::{DescriptorList, DescriptorTable, FeatureMatrix};
use crate::input::MoleculeInput;
use crate::model::TrainedModel;
use crate::padel::{DescriptorCalculator, PadelRun, PadelRunner};
use crate::prediction::PredictionTable;
use crate::{BioactivityError, Result, Shape};

/// Rows of each intermediate table kept for display.
pub const PREVIEW_ROWS: usize = 100;

/// Progress notifications, emitted in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    InputStaged { molecules: usize },
    CalculatingDescriptors,
    DescriptorsReady { shape: Shape },
    SubsetSelected { shape: Shape },
    Predicted { molecules: usize },
}

impl PipelineStage {
    pub fn message(&self) -> String {
        match self {
            Self::InputStaged { molecules } => format!("Staged {} molecules", molecules),
            Self::CalculatingDescriptors => "Calculating descriptors...".to_string(),
            Self::DescriptorsReady { shape } => format!("Calculated descriptors {}", shape),
            Self::SubsetSelected { shape } => format!("Selected descriptor subset {}", shape),
            Self::Predicted { molecules } => format!("Predicted {} molecules", molecules),
        }
    }
}

/// A table trimmed for display, with the shape of the full table.
#[derive(Debug, Clone, Serialize)]
pub struct Preview<T> {
    pub shape: Shape,
    pub head: T,
}

#[derive(Debug, Default)]
pub struct PredictionReport {
    pub input: Option<MoleculeInput>,
    pub tool_run: Option<PadelRun>,
    pub descriptors: Option<Preview<DescriptorTable>>,
    pub subset: Option<Preview<FeatureMatrix>>,
    pub predictions: Option<PredictionTable>,
    pub error: Option<BioactivityError>,
}

impl PredictionReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.predictions.is_some()
    }

    pub fn into_result(self) -> Result<PredictionTable> {
        match (self.error, self.predictions) {
            (Some(e), _) => Err(e),
            (None, Some(p)) => Ok(p),
            (None, None) => Err(BioactivityError::Other(anyhow::anyhow!("pipeline produced no predictions"))),
        }
    }
}

pub struct PredictionPipeline {
    workspace: WorkspaceConfig,
    model: ModelConfig,
    calculator: Arc<dyn DescriptorCalculator>,
}

impl PredictionPipeline {
    /// Pipeline backed by PaDEL-Descriptor.
    pub fn from_config(config: &Config) -> Self {
        Self::with_calculator(config, Arc::new(PadelRunner::new(config.padel.clone())))
    }

    pub fn with_calculator(config: &Config, calculator: Arc<dyn DescriptorCalculator>) -> Self {
        Self {
            workspace: config.workspace.clone(),
            model: config.model.clone(),
            calculator,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.workspace.output_path()
    }

    pub async fn run<F>(&self, upload: &[u8], observer: F) -> PredictionReport
    where
        F: Fn(PipelineStage) + Send + Sync,
    {
        let mut report = PredictionReport::default();
        match self.run_stages(upload, &observer, &mut report).await {
            Ok(()) => info!("Prediction run complete"),
            Err(e) => {
                error!("Prediction run failed: {}", e);
                report.error = Some(e);
            }
        }
        report
    }

    async fn run_stages<F>(&self, upload: &[u8], observer: &F, report: &mut PredictionReport) -> Result<()>
    where
        F: Fn(PipelineStage) + Send + Sync,
    {
        let input = MoleculeInput::parse(upload)?;
        input.write_smi(&self.workspace.input_path()).await?;
        observer(PipelineStage::InputStaged { molecules: input.len() });
        report.input = Some(input.clone());

        let output = self.workspace.output_path();
        remove_stale_output(&output).await?;

        observer(PipelineStage::CalculatingDescriptors);
        let run = self
            .calculator
            .calculate(Path::new(&self.workspace.dir), &output)
            .await?;
        let output_exists = run.output_exists;
        report.tool_run = Some(run);
        if !output_exists {
            return Err(BioactivityError::MissingOutput(output));
        }

        let table = DescriptorTable::from_csv(&output)?;
        let shape = table.shape();
        report.descriptors = Some(Preview { shape, head: table.preview(PREVIEW_ROWS) });
        observer(PipelineStage::DescriptorsReady { shape });

        // Loaded per run so the files can be swapped without a restart.
        let list = DescriptorList::from_csv(Path::new(&self.model.descriptor_list))?;
        let subset = table.select(&list)?;
        let shape = subset.shape();
        report.subset = Some(Preview { shape, head: subset.preview(PREVIEW_ROWS) });
        observer(PipelineStage::SubsetSelected { shape });

        let model = TrainedModel::load(Path::new(&self.model.path))?;
        let values = model.predict(&subset)?;
        let predictions = PredictionTable::build(&self.model.value_column, &input, &subset.row_names, &values);
        observer(PipelineStage::Predicted { molecules: predictions.len() });
        report.predictions = Some(predictions);

        Ok(())
    }
}

async fn remove_stale_output(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            warn!("Removed stale descriptor output {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
