//! Prediction output table and CSV download.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::input::MoleculeInput;
use crate::{BioactivityError, Result};

pub const DOWNLOAD_FILE_NAME: &str = "prediction.csv";
const NAME_COLUMN: &str = "molecule_name";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub molecule_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionTable {
    pub value_column: String,
    pub rows: Vec<Prediction>,
}

impl PredictionTable {
    /// Pair each prediction with the molecule name from the upload.
    /// Rows without a name fall back to the descriptor table's `Name`.
    pub fn build(
        value_column: &str,
        input: &MoleculeInput,
        descriptor_names: &[String],
        values: &[f64],
    ) -> Self {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let molecule_name = input
                    .name(i)
                    .map(str::to_string)
                    .or_else(|| descriptor_names.get(i).cloned())
                    .unwrap_or_default();
                Prediction { molecule_name, value }
            })
            .collect();

        Self { value_column: value_column.to_string(), rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `molecule_name,<value column>` followed by one line per molecule, no index.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([NAME_COLUMN, self.value_column.as_str()])?;
        for row in &self.rows {
            writer.write_record([row.molecule_name.clone(), format_value(row.value)])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| BioactivityError::Other(anyhow::anyhow!("flushing CSV: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| BioactivityError::Other(e.into()))
    }

    /// `data:` URI carrying the CSV, so the link works without a server round trip.
    pub fn data_uri(&self) -> Result<String> {
        let csv = self.to_csv()?;
        Ok(format!("data:file/csv;base64,{}", STANDARD.encode(csv.as_bytes())))
    }

    pub fn download_href(&self) -> Result<String> {
        Ok(format!(
            r#"<a href="{}" download="{}">Download Predictions</a>"#,
            self.data_uri()?,
            DOWNLOAD_FILE_NAME
        ))
    }
}

/// Whole numbers keep a trailing `.0` so the column always reads as float.
fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
