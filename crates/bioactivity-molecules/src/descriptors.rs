//! Descriptor tables produced by PaDEL-Descriptor and the subset the model expects.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::{BioactivityError, Result, Shape};

/// Column PaDEL-Descriptor uses for the molecule identifier.
pub const NAME_COLUMN: &str = "Name";

/// Raw descriptor CSV, cells kept as text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DescriptorTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl DescriptorTable {
    /// Read the calculated descriptors. A missing file is reported as `MissingOutput`.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BioactivityError::MissingOutput(path.to_path_buf()));
        }
        let reader = csv::Reader::from_path(path)?;
        let table = Self::from_reader(reader)?;
        info!("Loaded descriptors {} from {:?}", table.shape(), path);
        Ok(table)
    }

    pub fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, records })
    }

    pub fn shape(&self) -> Shape {
        Shape { rows: self.records.len(), columns: self.headers.len() }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Molecule identifiers from the `Name` column, empty when the column is absent.
    pub fn row_names(&self) -> Vec<String> {
        match self.column_index(NAME_COLUMN) {
            Some(idx) => self
                .records
                .iter()
                .map(|r| r.get(idx).cloned().unwrap_or_default())
                .collect(),
            None => vec![String::new(); self.records.len()],
        }
    }

    /// First `rows` records, for display.
    pub fn preview(&self, rows: usize) -> DescriptorTable {
        DescriptorTable {
            headers: self.headers.clone(),
            records: self.records.iter().take(rows).cloned().collect(),
        }
    }

    /// Keep exactly the listed columns, in list order, parsed as numbers.
    pub fn select(&self, list: &DescriptorList) -> Result<FeatureMatrix> {
        let index: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();

        let missing: Vec<String> = list
            .names
            .iter()
            .filter(|name| !index.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BioactivityError::MissingDescriptors(missing));
        }

        let positions: Vec<usize> = list.names.iter().map(|n| index[n.as_str()]).collect();

        let mut values = Vec::with_capacity(self.records.len());
        for (row_no, record) in self.records.iter().enumerate() {
            let row = positions
                .iter()
                .map(|&col| parse_cell(record.get(col).map(String::as_str).unwrap_or(""), row_no, &self.headers[col]))
                .collect::<Result<Vec<f64>>>()?;
            values.push(row);
        }

        debug!("Selected {} of {} descriptor columns", positions.len(), self.headers.len());
        Ok(FeatureMatrix {
            columns: list.names.clone(),
            row_names: self.row_names(),
            values,
        })
    }
}

fn parse_cell(cell: &str, row: usize, column: &str) -> Result<f64> {
    cell.trim().parse::<f64>().map_err(|_| {
        BioactivityError::InvalidInput(format!(
            "row {row}, column {column}: '{cell}' is not a number"
        ))
    })
}

/// Descriptor names the model was trained on, taken from the header row of `descriptor_list.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorList {
    pub names: Vec<String>,
}

impl DescriptorList {
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BioactivityError::Config(format!(
                "descriptor list not found: {}",
                path.display()
            )));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let names: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        Self::new(names)
    }

    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(BioactivityError::InvalidInput(
                "descriptor list has no columns".to_string(),
            ));
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Numeric model input: one row per molecule, one column per selected descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub row_names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn shape(&self) -> Shape {
        Shape { rows: self.values.len(), columns: self.columns.len() }
    }

    pub fn preview(&self, rows: usize) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.columns.clone(),
            row_names: self.row_names.iter().take(rows).cloned().collect(),
            values: self.values.iter().take(rows).cloned().collect(),
        }
    }
}
