//! Template-facing views of pipeline results.

use serde::Serialize;
use std::path::Path;

use bioactivity_molecules::descriptors::{DescriptorTable, FeatureMatrix, NAME_COLUMN};
use bioactivity_molecules::input::MoleculeInput;
use bioactivity_molecules::pipeline::{PredictionReport, Preview, PREVIEW_ROWS};
use bioactivity_molecules::prediction::PredictionTable;
use bioactivity_molecules::{BioactivityError, Shape};

#[derive(Debug, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub shape: String,
    pub truncated: bool,
}

impl TableView {
    fn new(headers: Vec<String>, rows: Vec<Vec<String>>, shape: Shape) -> Self {
        let truncated = rows.len() < shape.rows;
        Self { headers, rows, shape: shape.to_string(), truncated }
    }

    fn from_input(input: &MoleculeInput) -> Self {
        let shape = input.shape();
        let headers = (0..shape.columns).map(|i| i.to_string()).collect();
        let rows = input
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|r| {
                let mut cells = r.tokens.clone();
                cells.resize(shape.columns, String::new());
                cells
            })
            .collect();
        Self::new(headers, rows, shape)
    }

    fn from_descriptors(preview: &Preview<DescriptorTable>) -> Self {
        Self::new(preview.head.headers.clone(), preview.head.records.clone(), preview.shape)
    }

    fn from_subset(preview: &Preview<FeatureMatrix>) -> Self {
        let head = &preview.head;
        let mut headers = vec![NAME_COLUMN.to_string()];
        headers.extend(head.columns.iter().cloned());
        let rows = head
            .row_names
            .iter()
            .zip(&head.values)
            .map(|(name, values)| {
                std::iter::once(name.clone())
                    .chain(values.iter().map(|v| v.to_string()))
                    .collect()
            })
            .collect();
        Self::new(headers, rows, preview.shape)
    }

    fn from_predictions(table: &PredictionTable) -> Self {
        let headers = vec!["molecule_name".to_string(), table.value_column.clone()];
        let rows = table
            .rows
            .iter()
            .map(|p| vec![p.molecule_name.clone(), format!("{:.4}", p.value)])
            .collect();
        Self::new(headers, rows, Shape { rows: table.len(), columns: 2 })
    }
}

#[derive(Debug, Serialize)]
pub struct ToolView {
    pub stdout: String,
    pub stderr: String,
    pub output: String,
    pub output_exists: bool,
    pub elapsed: String,
}

#[derive(Debug, Serialize)]
pub struct PredictionsView {
    pub table: TableView,
    pub href: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ErrorView {
    pub title: String,
    pub message: String,
    pub stderr: Option<String>,
    pub stdout: Option<String>,
}

impl ErrorView {
    pub fn new(title: &str, message: impl Into<String>) -> Self {
        Self { title: title.to_string(), message: message.into(), ..Default::default() }
    }

    pub fn from_error(err: &BioactivityError) -> Self {
        match err {
            BioactivityError::DescriptorTool { code, stderr, stdout } => Self {
                title: "Error running the descriptor command".to_string(),
                message: format!(
                    "Exit code: {}",
                    code.map(|c| c.to_string()).unwrap_or_else(|| "terminated by signal".to_string())
                ),
                stderr: Some(stderr.clone()).filter(|s| !s.is_empty()),
                stdout: Some(stdout.clone()).filter(|s| !s.is_empty()),
            },
            BioactivityError::MissingOutput(path) => Self::new(
                "Descriptors not found",
                format!("Error: {} was not found!", path.display()),
            ),
            BioactivityError::MissingDescriptors(_) => Self::new("Descriptor mismatch", err.to_string()),
            BioactivityError::InvalidInput(msg) => Self::new("Invalid input file", msg.clone()),
            other => Self::new("Prediction failed", other.to_string()),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ReportView {
    pub input: Option<TableView>,
    pub tool: Option<ToolView>,
    pub descriptors: Option<TableView>,
    pub subset: Option<TableView>,
    pub predictions: Option<PredictionsView>,
    pub error: Option<ErrorView>,
}

impl ReportView {
    pub fn from_report(report: &PredictionReport) -> Self {
        let mut view = Self {
            input: report.input.as_ref().map(TableView::from_input),
            tool: report.tool_run.as_ref().map(|run| ToolView {
                stdout: run.stdout.clone(),
                stderr: run.stderr.clone(),
                output: display_name(&run.output),
                output_exists: run.output_exists,
                elapsed: format!("{:.1}s", run.elapsed_ms as f64 / 1000.0),
            }),
            descriptors: report.descriptors.as_ref().map(TableView::from_descriptors),
            subset: report.subset.as_ref().map(TableView::from_subset),
            predictions: None,
            error: report.error.as_ref().map(ErrorView::from_error),
        };

        if let Some(table) = &report.predictions {
            match table.download_href() {
                Ok(href) => {
                    view.predictions = Some(PredictionsView { table: TableView::from_predictions(table), href })
                }
                Err(e) => view.error = Some(ErrorView::from_error(&e)),
            }
        }
        view
    }

    pub fn error(error: ErrorView) -> Self {
        Self { error: Some(error), ..Default::default() }
    }
}

/// Descriptor file left over from a previous run, shown on page load.
#[derive(Debug, Serialize)]
pub struct ExistingDescriptors {
    pub path: String,
    pub found: bool,
    pub shape: Option<String>,
    /// Set when the file exists but could not be read as a descriptor table.
    pub error: Option<String>,
}

impl ExistingDescriptors {
    pub fn probe(path: &Path) -> Self {
        let mut existing = Self { path: display_name(path), found: false, shape: None, error: None };
        match DescriptorTable::from_csv(path) {
            Ok(table) => {
                existing.found = true;
                existing.shape = Some(table.shape().to_string());
            }
            Err(BioactivityError::MissingOutput(_)) => {}
            Err(e) => {
                existing.found = true;
                existing.error = Some(e.to_string());
            }
        }
        existing
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_view_shows_code_and_streams() {
        let view = ErrorView::from_error(&BioactivityError::DescriptorTool {
            code: Some(1),
            stderr: "Unable to access jarfile".into(),
            stdout: String::new(),
        });
        assert_eq!(view.message, "Exit code: 1");
        assert_eq!(view.stderr.as_deref(), Some("Unable to access jarfile"));
        assert!(view.stdout.is_none());
    }

    #[test]
    fn test_missing_output_view() {
        let view = ErrorView::from_error(&BioactivityError::MissingOutput("work/descriptors_output.csv".into()));
        assert_eq!(view.message, "Error: work/descriptors_output.csv was not found!");
    }

    #[test]
    fn test_input_view_pads_short_rows() {
        let input = MoleculeInput::parse(b"CCO ethanol\nCCN\n").unwrap();
        let view = TableView::from_input(&input);
        assert_eq!(view.headers, vec!["0", "1"]);
        assert_eq!(view.rows[1], vec!["CCN".to_string(), String::new()]);
        assert_eq!(view.shape, "(2, 2)");
        assert!(!view.truncated);
    }

    #[test]
    fn test_probe_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = ExistingDescriptors::probe(&dir.path().join("descriptors_output.csv"));
        assert!(!existing.found);
        assert!(existing.error.is_none());
        assert_eq!(existing.path, "descriptors_output.csv");
    }

    #[test]
    fn test_probe_reads_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descriptors_output.csv");
        std::fs::write(&path, "Name,PubchemFP0,PubchemFP1\nAUTOGEN_1,1,0\n").unwrap();

        let existing = ExistingDescriptors::probe(&path);
        assert!(existing.found);
        assert_eq!(existing.shape.as_deref(), Some("(1, 3)"));
        assert!(existing.error.is_none());
    }

    #[test]
    fn test_probe_truncated_file_is_not_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descriptors_output.csv");
        std::fs::write(&path, "Name,PubchemFP0,PubchemFP1\nAUTOGEN_1,1\n").unwrap();

        let existing = ExistingDescriptors::probe(&path);
        assert!(existing.found);
        assert!(existing.shape.is_none());
        assert!(existing.error.is_some());
    }
}
