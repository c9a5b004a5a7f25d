//! Job execution behind the command-line subcommands

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::args::{Commands, JobArgs, SplitName};
use crate::pipeline::{
    correlation_analysis, describe_dataset, evaluate_model, full_pipeline, preprocessing_preview,
    run_logistic_regression, split_dataset, split_dataset_to_store, JobConfig,
};
use crate::report::JobReport;
use crate::store::SplitStore;
use crate::utils::{create_spinner, finish_with_failure, finish_with_success};

/// Load job configuration from an optional JSON file, then apply flag overrides
pub fn load_config(args: &JobArgs) -> Result<JobConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        }
        None => JobConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

/// Read the raw bytes of an input file
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}

/// Run the job a subcommand names.
///
/// Returns `Ok(None)` for commands that do not run a job.
pub fn run_job(command: &Commands, bytes: &[u8], config: &JobConfig, quiet: bool) -> Result<Option<JobReport>> {
    let label = match command {
        Commands::Logistic(_) => "Training logistic regression...",
        Commands::Correlation(_) => "Computing correlations...",
        Commands::Split { store: Some(_), .. } => "Splitting and persisting...",
        Commands::Split { .. } => "Splitting dataset...",
        Commands::Preprocess(_) => "Scaling preview columns...",
        Commands::Pipeline(_) => "Running preprocessing pipeline...",
        Commands::Evaluate(_) => "Training and evaluating...",
        Commands::Describe(_) => "Summarizing columns...",
        Commands::Download { .. } => return Ok(None),
    };

    let spinner = create_spinner(label, quiet);
    let outcome = match command {
        Commands::Logistic(_) => run_logistic_regression(bytes, config).map(JobReport::Logistic),
        Commands::Correlation(_) => correlation_analysis(bytes, config).map(JobReport::Correlation),
        Commands::Split { store: Some(dir), .. } => {
            split_dataset_to_store(bytes, config, &SplitStore::new(dir)).map(JobReport::Split)
        }
        Commands::Split { .. } => split_dataset(bytes, config).map(JobReport::Split),
        Commands::Preprocess(_) => preprocessing_preview(bytes, config).map(JobReport::Preview),
        Commands::Pipeline(_) => full_pipeline(bytes, config).map(JobReport::Pipeline),
        Commands::Evaluate(_) => evaluate_model(bytes, config).map(JobReport::Evaluation),
        Commands::Describe(_) => describe_dataset(bytes, config).map(JobReport::Describe),
        Commands::Download { .. } => return Ok(None),
    };

    match outcome {
        Ok(report) => {
            finish_with_success(&spinner, &format!("{} job complete", command.name()));
            Ok(Some(report))
        }
        Err(e) => {
            finish_with_failure(&spinner, e.kind());
            Err(anyhow::Error::new(e).context(format!("{} job failed", command.name())))
        }
    }
}

/// Copy a persisted split to a file or stdout
pub fn run_download(split: SplitName, store_dir: &Path, output: Option<&Path>) -> Result<()> {
    let store = SplitStore::new(store_dir);
    let bytes = store
        .retrieve(split.as_str())
        .with_context(|| format!("Failed to read split '{}' from {}", split.as_str(), store_dir.display()))?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Split '{}' not found in {}",
                split.as_str(),
                store_dir.display()
            )
        })?;

    match output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write split file: {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&bytes)
            .context("Failed to write split to stdout")?,
    }
    Ok(())
}
