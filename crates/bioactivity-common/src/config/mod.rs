//! Configuration loading for the bioactivity app.
//! Reads bioactivity.toml from the current directory or path in BIOACTIVITY_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BioactivityError, Result};

pub const CONFIG_ENV: &str = "BIOACTIVITY_CONFIG";
pub const BIND_ENV: &str = "BIOACTIVITY_BIND";
pub const DEFAULT_CONFIG_FILE: &str = "bioactivity.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub padel: PadelConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

fn default_bind()       -> String { "127.0.0.1:3001".to_string() }
fn default_static_dir() -> String { "crates/bioactivity-web/static".to_string() }
fn default_max_upload() -> usize  { 2 * 1024 * 1024 }

/// How PaDEL-Descriptor is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadelConfig {
    #[serde(default = "default_java")]
    pub java: String,
    #[serde(default = "default_jar")]
    pub jar: String,
    #[serde(default = "default_descriptor_types")]
    pub descriptor_types: String,
    /// Passed as both -Xms and -Xmx.
    #[serde(default = "default_heap")]
    pub heap: String,
    #[serde(default = "bool_true")]
    pub headless: bool,
    #[serde(default = "bool_true")]
    pub remove_salt: bool,
    #[serde(default = "bool_true")]
    pub standardize_nitro: bool,
    #[serde(default = "bool_true")]
    pub fingerprints: bool,
    /// Unset means wait for the process however long it takes.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for PadelConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            jar: default_jar(),
            descriptor_types: default_descriptor_types(),
            heap: default_heap(),
            headless: true,
            remove_salt: true,
            standardize_nitro: true,
            fingerprints: true,
            timeout_secs: None,
        }
    }
}

fn default_java()             -> String { "/usr/lib/jvm/java-11-openjdk-amd64/bin/java".to_string() }
fn default_jar()              -> String { "./PaDEL-Descriptor/PaDEL-Descriptor.jar".to_string() }
fn default_descriptor_types() -> String { "./PaDEL-Descriptor/PubchemFingerprinter.xml".to_string() }
fn default_heap()             -> String { "2G".to_string() }
fn bool_true()                -> bool   { true }

/// Working files shared by every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_workspace_dir")]
    pub dir: String,
    #[serde(default = "default_input_file")]
    pub input_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir: default_workspace_dir(),
            input_file: default_input_file(),
            output_file: default_output_file(),
        }
    }
}

fn default_workspace_dir() -> String { "./".to_string() }
fn default_input_file()    -> String { "molecule.smi".to_string() }
fn default_output_file()   -> String { "descriptors_output.csv".to_string() }

impl WorkspaceConfig {
    pub fn input_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.output_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: String,
    #[serde(default = "default_descriptor_list")]
    pub descriptor_list: String,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            descriptor_list: default_descriptor_list(),
            target: default_target(),
            value_column: default_value_column(),
        }
    }
}

fn default_model_path()      -> String { "MGMT_model.json".to_string() }
fn default_descriptor_list() -> String { "descriptor_list.csv".to_string() }
fn default_target()          -> String { "MGMT".to_string() }
fn default_value_column()    -> String { "pIC50".to_string() }


impl Config {
    /// Load configuration from bioactivity.toml.
    /// Checks BIOACTIVITY_CONFIG env var first, then current directory.
    /// Without either, the built-in defaults are used.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            Err(_) => {
                tracing::warn!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        if let Ok(bind) = std::env::var(BIND_ENV) {
            config.server.bind = bind;
        }
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BioactivityError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BioactivityError::Config(e.to_string()))
    }
}
