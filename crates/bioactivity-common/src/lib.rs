//! bioactivity-common — Shared error type and configuration used across the bioactivity crates.

pub mod error;
pub mod config;

// Re-export commonly used types
pub use config::Config;
pub use error::{BioactivityError, Result};
