//! End-to-end pipeline runs against a stand-in descriptor calculator.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use bioactivity_common::Config;
use bioactivity_molecules::padel::{DescriptorCalculator, PadelRun};
use bioactivity_molecules::pipeline::{PipelineStage, PredictionPipeline};
use bioactivity_molecules::{BioactivityError, Result, Shape};

const UPLOAD: &[u8] = b"Nc1nc(OCc2cccs2Br)c2[nH]cnc2n1 lomeguatrib\nCCO ethanol\n";

const DESCRIPTORS: &str = "\
Name,PubchemFP0,PubchemFP1,PubchemFP2,PubchemFP3
AUTOGEN_molecule_1,1,1,0,1
AUTOGEN_molecule_2,0,0,0,1
";

const MODEL: &str = r#"{
    "target": "MGMT",
    "feature_names": ["PubchemFP3", "PubchemFP1"],
    "estimator": {"kind": "linear", "intercept": 4.0, "coefficients": [0.5, 1.5]}
}"#;

enum Behaviour {
    WriteCsv,
    SkipOutput,
    Fail,
}

struct FakePadel {
    behaviour: Behaviour,
}

#[async_trait]
impl DescriptorCalculator for FakePadel {
    async fn calculate(&self, input_dir: &Path, output: &Path) -> Result<PadelRun> {
        assert!(input_dir.join("molecule.smi").exists(), "molecules must be staged first");
        match self.behaviour {
            Behaviour::WriteCsv => std::fs::write(output, DESCRIPTORS)?,
            Behaviour::SkipOutput => {}
            Behaviour::Fail => {
                return Err(BioactivityError::DescriptorTool {
                    code: Some(1),
                    stderr: "Error: Unable to access jarfile ./PaDEL-Descriptor/PaDEL-Descriptor.jar".to_string(),
                    stdout: String::new(),
                })
            }
        }
        Ok(PadelRun {
            stdout: "Descriptor calculation completed".to_string(),
            stderr: String::new(),
            output: output.to_path_buf(),
            output_exists: output.exists(),
            elapsed_ms: 1,
        })
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    config: Config,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("descriptor_list.csv"), "PubchemFP3,PubchemFP1\n").unwrap();
    std::fs::write(root.join("MGMT_model.json"), MODEL).unwrap();

    let mut config = Config::default();
    config.workspace.dir = root.to_string_lossy().into_owned();
    config.model.path = root.join("MGMT_model.json").to_string_lossy().into_owned();
    config.model.descriptor_list = root.join("descriptor_list.csv").to_string_lossy().into_owned();
    Fixture { dir, config }
}

fn pipeline(fixture: &Fixture, behaviour: Behaviour) -> PredictionPipeline {
    PredictionPipeline::with_calculator(&fixture.config, Arc::new(FakePadel { behaviour }))
}

#[tokio::test]
async fn test_successful_run_predicts_every_molecule() {
    let fx = fixture();
    let stages = Mutex::new(Vec::new());

    let report = pipeline(&fx, Behaviour::WriteCsv)
        .run(UPLOAD, |stage| stages.lock().unwrap().push(stage))
        .await;

    assert!(report.is_success(), "unexpected error: {:?}", report.error);

    let descriptors = report.descriptors.as_ref().unwrap();
    assert_eq!(descriptors.shape, Shape { rows: 2, columns: 5 });
    assert_eq!(descriptors.head.headers[0], "Name");

    let subset = report.subset.as_ref().unwrap();
    assert_eq!(subset.head.columns, vec!["PubchemFP3", "PubchemFP1"]);
    assert_eq!(subset.shape, Shape { rows: 2, columns: 2 });

    let predictions = report.into_result().unwrap();
    assert_eq!(predictions.rows[0].molecule_name, "lomeguatrib");
    assert_eq!(predictions.rows[0].value, 6.0);
    assert_eq!(predictions.rows[1].molecule_name, "ethanol");
    assert_eq!(predictions.rows[1].value, 4.5);

    let stages = stages.into_inner().unwrap();
    assert_eq!(stages.first(), Some(&PipelineStage::InputStaged { molecules: 2 }));
    assert_eq!(stages.last(), Some(&PipelineStage::Predicted { molecules: 2 }));

    let smi = std::fs::read_to_string(fx.dir.path().join("molecule.smi")).unwrap();
    assert_eq!(smi, "Nc1nc(OCc2cccs2Br)c2[nH]cnc2n1\tlomeguatrib\nCCO\tethanol\n");
}

#[tokio::test]
async fn test_tool_failure_is_surfaced() {
    let fx = fixture();
    let report = pipeline(&fx, Behaviour::Fail).run(UPLOAD, |_| {}).await;

    assert!(report.input.is_some());
    assert!(report.tool_run.is_none());
    match report.error {
        Some(BioactivityError::DescriptorTool { code, stderr, .. }) => {
            assert_eq!(code, Some(1));
            assert!(stderr.contains("Unable to access jarfile"));
        }
        other => panic!("expected DescriptorTool, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_output_stops_before_subset() {
    let fx = fixture();
    let report = pipeline(&fx, Behaviour::SkipOutput).run(UPLOAD, |_| {}).await;

    assert!(report.tool_run.is_some(), "tool log is kept for display");
    assert!(report.descriptors.is_none());
    assert!(matches!(report.error, Some(BioactivityError::MissingOutput(_))));
}

#[tokio::test]
async fn test_stale_output_is_not_reused() {
    let fx = fixture();
    std::fs::write(fx.dir.path().join("descriptors_output.csv"), DESCRIPTORS).unwrap();

    let report = pipeline(&fx, Behaviour::SkipOutput).run(UPLOAD, |_| {}).await;

    assert!(matches!(report.error, Some(BioactivityError::MissingOutput(_))));
    assert!(!fx.dir.path().join("descriptors_output.csv").exists());
}

#[tokio::test]
async fn test_descriptor_list_mismatch_names_columns() {
    let fx = fixture();
    std::fs::write(fx.dir.path().join("descriptor_list.csv"), "PubchemFP3,PubchemFP880\n").unwrap();

    let report = pipeline(&fx, Behaviour::WriteCsv).run(UPLOAD, |_| {}).await;

    assert!(report.descriptors.is_some());
    match report.error {
        Some(BioactivityError::MissingDescriptors(missing)) => assert_eq!(missing, vec!["PubchemFP880"]),
        other => panic!("expected MissingDescriptors, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_upload_never_reaches_tool() {
    let fx = fixture();
    let report = pipeline(&fx, Behaviour::Fail).run(b"   \n", |_| {}).await;

    assert!(report.input.is_none());
    assert!(matches!(report.error, Some(BioactivityError::InvalidInput(_))));
}
