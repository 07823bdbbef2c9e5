use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BioactivityError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not start {program}: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Descriptor calculation failed (exit code: {})", .code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    DescriptorTool {
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("Descriptor calculation timed out after {0}s")]
    ToolTimeout(u64),

    #[error("{} was not found", .0.display())]
    MissingOutput(PathBuf),

    #[error("Descriptors missing from calculated output: {}", .0.join(", "))]
    MissingDescriptors(Vec<String>),

    #[error("Model error: {0}")]
    Model(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BioactivityError {
    /// True for failures caused by the uploaded file rather than the server setup.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::MissingDescriptors(_))
    }
}

pub type Result<T> = std::result::Result<T, BioactivityError>;
