//! bioactivity-web — Web GUI for the bioactivity prediction pipeline.
//! A single page with:
//!   - molecule file upload
//!   - PaDEL-Descriptor output and descriptor tables
//!   - pIC50 predictions with CSV download
//!   - live pipeline progress over SSE

pub mod router;
pub mod handlers;
pub mod state;
pub mod sse;
pub mod templates;
