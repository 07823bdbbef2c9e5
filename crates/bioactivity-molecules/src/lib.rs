//! Bioactivity Molecules - Descriptor calculation and potency prediction.
//!
//! One fixed pipeline:
//! 1. Staging the uploaded molecule file as `molecule.smi`
//! 2. Computing PubChem fingerprints with PaDEL-Descriptor
//! 3. Selecting the descriptor subset the model was trained on
//! 4. Predicting pIC50 with the pre-trained regression model
//! 5. Producing the prediction table and CSV download

pub mod input;
pub mod padel;
pub mod descriptors;
pub mod model;
pub mod prediction;
pub mod pipeline;

pub use bioactivity_common::{BioactivityError, Result};

/// Rows × columns, as shown next to every table in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.rows, self.columns)
    }
}
