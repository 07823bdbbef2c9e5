//! Uploaded molecule file.
//!
//! The upload is a plain text file with one molecule per line: the SMILES
//! string followed by the molecule name, separated by whitespace, no header.

use std::path::Path;
use serde::Serialize;
use tracing::debug;

use crate::{BioactivityError, Result, Shape};

/// One line of the uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoleculeRecord {
    pub tokens: Vec<String>,
}

impl MoleculeRecord {
    pub fn smiles(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.tokens.get(1).map(String::as_str)
    }
}

/// Parsed contents of an uploaded molecule file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoleculeInput {
    pub rows: Vec<MoleculeRecord>,
}

impl MoleculeInput {
    /// Parse raw upload bytes. Blank lines are skipped.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| BioactivityError::InvalidInput(format!("input file is not valid UTF-8: {}", e)))?;

        let rows: Vec<MoleculeRecord> = text
            .lines()
            .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|tokens| !tokens.is_empty())
            .map(|tokens| MoleculeRecord { tokens })
            .collect();

        if rows.is_empty() {
            return Err(BioactivityError::InvalidInput(
                "input file contains no molecules".to_string(),
            ));
        }

        debug!("Parsed {} molecules from upload", rows.len());
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row wins, like a dataframe padded with empty cells.
    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows.len(),
            columns: self.rows.iter().map(|r| r.tokens.len()).max().unwrap_or(0),
        }
    }

    /// Name of the molecule on row `index`, if the row has one.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.rows.get(index).and_then(MoleculeRecord::name)
    }

    /// Tab-separated rendering, no header and no index column.
    pub fn to_smi(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.tokens.join("\t"));
            out.push('\n');
        }
        out
    }

    /// Write the molecules where PaDEL-Descriptor will pick them up.
    pub async fn write_smi(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.to_smi()).await?;
        debug!("Wrote {} molecules to {:?}", self.rows.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOMEGUATRIB: &str = "Nc1nc(OCc2cccs2Br)c2[nH]cnc2n1 lomeguatrib\n";

    #[test]
    fn test_parse_smiles_and_name() {
        let input = MoleculeInput::parse(LOMEGUATRIB.as_bytes()).unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(input.rows[0].smiles(), "Nc1nc(OCc2cccs2Br)c2[nH]cnc2n1");
        assert_eq!(input.rows[0].name(), Some("lomeguatrib"));
        assert_eq!(input.shape(), Shape { rows: 1, columns: 2 });
    }

    #[test]
    fn test_blank_lines_and_crlf_are_ignored() {
        let input = MoleculeInput::parse(b"CCO ethanol\r\n\r\n  \nc1ccccc1 benzene\r\n").unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(input.name(1), Some("benzene"));
        assert_eq!(input.name(2), None);
    }

    #[test]
    fn test_row_without_name() {
        let input = MoleculeInput::parse(b"CCO\nCCN amine\n").unwrap();
        assert_eq!(input.name(0), None);
        assert_eq!(input.shape().columns, 2);
    }

    #[test]
    fn test_empty_upload_rejected() {
        let err = MoleculeInput::parse(b"\n\n").unwrap_err();
        assert!(matches!(err, BioactivityError::InvalidInput(_)));
    }

    #[test]
    fn test_non_utf8_rejected() {
        let err = MoleculeInput::parse(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_smi_is_tab_separated() {
        let input = MoleculeInput::parse(b"CCO ethanol\nCCN   ethylamine\n").unwrap();
        assert_eq!(input.to_smi(), "CCO\tethanol\nCCN\tethylamine\n");
    }

    #[tokio::test]
    async fn test_write_smi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work").join("molecule.smi");
        let input = MoleculeInput::parse(LOMEGUATRIB.as_bytes()).unwrap();

        input.write_smi(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Nc1nc(OCc2cccs2Br)c2[nH]cnc2n1\tlomeguatrib\n");
    }
}
