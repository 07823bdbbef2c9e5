//! Descriptor calculation using PaDEL-Descriptor.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

use bioactivity_common::config::PadelConfig;
use crate::{BioactivityError, Result};

/// Captured result of a successful descriptor calculation.
#[derive(Debug, Clone, Serialize)]
pub struct PadelRun {
    pub stdout: String,
    pub stderr: String,
    pub output: PathBuf,
    pub output_exists: bool,
    pub elapsed_ms: u128,
}

/// Anything that turns the molecule files in `input_dir` into a descriptor CSV at `output`.
#[async_trait]
pub trait DescriptorCalculator: Send + Sync {
    async fn calculate(&self, input_dir: &Path, output: &Path) -> Result<PadelRun>;
}

/// Wrapper for PaDEL-Descriptor execution.
pub struct PadelRunner {
    config: PadelConfig,
}

impl PadelRunner {
    pub fn new(config: PadelConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the java binary.
    pub fn args(&self, input_dir: &Path, output: &Path) -> Vec<String> {
        let cfg = &self.config;
        let mut args = vec![
            format!("-Xms{}", cfg.heap),
            format!("-Xmx{}", cfg.heap),
        ];
        if cfg.headless {
            args.push("-Djava.awt.headless=true".to_string());
        }
        args.push("-jar".to_string());
        args.push(cfg.jar.clone());
        if cfg.remove_salt {
            args.push("-removesalt".to_string());
        }
        if cfg.standardize_nitro {
            args.push("-standardizenitro".to_string());
        }
        if cfg.fingerprints {
            args.push("-fingerprints".to_string());
        }
        args.push("-descriptortypes".to_string());
        args.push(cfg.descriptor_types.clone());
        args.push("-dir".to_string());
        args.push(input_dir.to_string_lossy().into_owned());
        args.push("-file".to_string());
        args.push(output.to_string_lossy().into_owned());
        args
    }

    /// Full command line, for logs and the UI.
    pub fn command_line(&self, input_dir: &Path, output: &Path) -> String {
        let mut parts = vec![self.config.java.clone()];
        parts.extend(self.args(input_dir, output));
        parts.join(" ")
    }

    async fn spawn(&self, input_dir: &Path, output: &Path) -> Result<Output> {
        let mut command = Command::new(&self.config.java);
        command
            .args(self.args(input_dir, output))
            .kill_on_drop(true);

        let launch_error = |source| BioactivityError::ToolLaunch {
            program: self.config.java.clone(),
            source,
        };

        match self.config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), command.output())
                .await
                .map_err(|_| BioactivityError::ToolTimeout(secs))?
                .map_err(launch_error),
            None => command.output().await.map_err(launch_error),
        }
    }
}

#[async_trait]
impl DescriptorCalculator for PadelRunner {
    async fn calculate(&self, input_dir: &Path, output: &Path) -> Result<PadelRun> {
        info!("Running PaDEL-Descriptor on {:?}", input_dir);
        debug!("{}", self.command_line(input_dir, output));

        let started = Instant::now();
        let result = self.spawn(input_dir, output).await?;

        let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();

        if !result.status.success() {
            warn!("PaDEL-Descriptor exited with {:?}", result.status.code());
            return Err(BioactivityError::DescriptorTool {
                code: result.status.code(),
                stderr,
                stdout,
            });
        }

        let output_exists = tokio::fs::try_exists(output).await.unwrap_or(false);
        if output_exists {
            debug!("PaDEL-Descriptor completed successfully. Output in {:?}", output);
        } else {
            warn!("PaDEL-Descriptor exited cleanly but {:?} was not written", output);
        }

        Ok(PadelRun {
            stdout,
            stderr,
            output: output.to_path_buf(),
            output_exists,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}
