//! JSON export of job results

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::summary::JobReport;
use crate::pipeline::JobConfig;

/// Metadata about the job run
#[derive(Debug, Serialize)]
pub struct ExportMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub kddlab_version: String,
    pub job: String,
    pub input_file: String,
    pub seed: u64,
}

/// Result file written by `--output`
#[derive(Debug, Serialize)]
pub struct JobExport<'a> {
    pub metadata: ExportMetadata,
    pub config: &'a JobConfig,
    pub result: &'a JobReport,
}

impl<'a> JobExport<'a> {
    pub fn new(job: &str, input: &Path, config: &'a JobConfig, result: &'a JobReport) -> Self {
        Self {
            metadata: ExportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                kddlab_version: env!("CARGO_PKG_VERSION").to_string(),
                job: job.to_string(),
                input_file: input.display().to_string(),
                seed: config.seed,
            },
            config,
            result,
        }
    }

    /// Write the export as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize job result")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write result file: {}", path.display()))?;
        Ok(())
    }
}
