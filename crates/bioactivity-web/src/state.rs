//! Shared application state for the web server.

use std::sync::Arc;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};

use bioactivity_common::Config;
use bioactivity_molecules::pipeline::{PipelineStage, PredictionPipeline};
use bioactivity_molecules::prediction::PredictionTable;

use crate::templates::Templates;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A pipeline stage started or finished
    PipelineStatus { stage: PipelineStage, message: String },
    /// A prediction run ended
    RunFinished { success: bool, message: String },
}

impl AppEvent {
    /// SSE event name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PipelineStatus { .. } => "pipeline_status",
            Self::RunFinished { .. } => "run_finished",
        }
    }
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub pipeline: PredictionPipeline,
    pub templates: Templates,
    /// Working files are shared, so only one run at a time.
    pub run_lock: Mutex<()>,
    /// Last successful prediction, served at /prediction.csv
    pub last_prediction: RwLock<Option<PredictionTable>>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let pipeline = PredictionPipeline::from_config(&config);
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: Config, pipeline: PredictionPipeline) -> anyhow::Result<Self> {
        let (event_tx, _) = broadcast::channel(64);
        Ok(Self {
            config,
            pipeline,
            templates: Templates::new()?,
            run_lock: Mutex::new(()),
            last_prediction: RwLock::new(None),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Fire-and-forget; no subscribers is fine.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
