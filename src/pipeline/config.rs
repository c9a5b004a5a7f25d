//! Job configuration
//!
//! Defaults follow the usual NSL-KDD experiment setup (seed 42,
//! 60/20/20 split stratified on `protocol_type`, 80/20 and 70/30 hold-outs
//! for the classification jobs). Every field can be overridden from a JSON
//! file; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use super::classifier::LogisticRegression;
use super::conditioning::{default_noise_rules, NoiseRule};
use super::labels::LabelMapping;
use super::preprocess::{Imputation, PreprocessConfig, ScalerKind};
use super::split::SplitRatios;

/// Default number of rows shown in preview heads
pub const DEFAULT_HEAD_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Seed for every shuffle in a job
    pub seed: u64,
    pub label: LabelMapping,

    // Splitting
    /// Column whose proportions the three-way split preserves
    pub stratify_column: String,
    pub split: SplitRatios,
    /// Hold-out fraction of the logistic regression job
    pub logistic_test_fraction: f64,
    /// Hold-out fraction of the evaluation job
    pub evaluation_test_fraction: f64,

    // Modelling
    pub classifier: LogisticRegression,
    /// Preprocessing used before the classifier
    pub classifier_preprocess: PreprocessConfig,
    /// Preprocessing used by the full pipeline job
    pub pipeline_preprocess: PreprocessConfig,
    /// Mid-range blanking applied to the training split of the full pipeline job
    pub noise_rules: Vec<NoiseRule>,

    // Reporting
    /// Numeric columns scaled by the preprocessing preview
    pub preview_columns: Vec<String>,
    pub scatter_x: String,
    pub scatter_y: String,
    pub head_rows: usize,
    pub head_digits: i32,
    pub correlation_digits: i32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            label: LabelMapping::default(),
            stratify_column: "protocol_type".to_string(),
            split: SplitRatios::default(),
            logistic_test_fraction: 0.2,
            evaluation_test_fraction: 0.3,
            classifier: LogisticRegression::default(),
            classifier_preprocess: PreprocessConfig::new(ScalerKind::Standard, Imputation::Median),
            pipeline_preprocess: PreprocessConfig::new(ScalerKind::Robust, Imputation::Median),
            noise_rules: default_noise_rules(),
            preview_columns: vec!["src_bytes".to_string(), "dst_bytes".to_string()],
            scatter_x: "same_srv_rate".to_string(),
            scatter_y: "dst_host_srv_count".to_string(),
            head_rows: DEFAULT_HEAD_ROWS,
            head_digits: 3,
            correlation_digits: 3,
        }
    }
}
