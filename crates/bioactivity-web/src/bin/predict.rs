//! Headless prediction run: same pipeline as the web page, output written to CSV.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use bioactivity_common::config::CONFIG_ENV;
use bioactivity_common::Config;
use bioactivity_molecules::pipeline::PredictionPipeline;
use bioactivity_molecules::BioactivityError;

#[derive(Debug, Parser)]
#[command(name = "bioactivity-predict", version, about = "Predict pIC50 for a molecule file")]
struct Args {
    /// Whitespace-separated molecule file (SMILES, name)
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the prediction table
    #[arg(short, long, default_value = "prediction.csv")]
    output: PathBuf,

    /// Configuration file
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bioactivity=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    let upload = tokio::fs::read(&args.input).await?;
    let pipeline = PredictionPipeline::from_config(&config);
    let report = pipeline
        .run(&upload, |stage| eprintln!("{}", stage.message()))
        .await;

    if let Some(run) = &report.tool_run {
        if !run.stderr.is_empty() {
            eprintln!("{}", run.stderr);
        }
    }
    if let Some(descriptors) = &report.descriptors {
        eprintln!("Calculated molecular descriptors: {}", descriptors.shape);
    }
    if let Some(subset) = &report.subset {
        eprintln!("Descriptor subset: {}", subset.shape);
    }

    match &report.error {
        Some(BioactivityError::DescriptorTool { code, stderr, stdout }) => {
            eprintln!("Error running the descriptor command");
            match code {
                Some(code) => eprintln!("Exit code: {}", code),
                None => eprintln!("Exit code: terminated by signal"),
            }
            if !stderr.is_empty() {
                eprintln!("Errors:\n{}", stderr.trim_end());
            }
            if !stdout.is_empty() {
                eprintln!("Command output:\n{}", stdout.trim_end());
            }
        }
        Some(BioactivityError::MissingOutput(path)) => {
            eprintln!("Error: {} was not found!", path.display());
        }
        _ => {}
    }

    let predictions = report.into_result()?;
    tokio::fs::write(&args.output, predictions.to_csv()?).await?;
    println!("Wrote {} predictions to {}", predictions.len(), args.output.display());

    Ok(())
}
