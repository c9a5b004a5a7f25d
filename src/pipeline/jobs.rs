//! Request-scoped analysis jobs
//!
//! Each job takes the raw bytes of an ARFF file plus a [`JobConfig`], runs
//! the stages it needs from start to finish and returns a serializable
//! result. Jobs share nothing: every call parses its own table, fits its own
//! transform state and seeds its own RNG.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::conditioning::{drop_incomplete_rows, inject_noise};
use super::config::JobConfig;
use super::correlation::{correlation_matrix, scatter_pairs, CorrelationMatrix};
use super::describe::{analyze_missing_values, describe, DatasetSummary};
use super::error::PipelineResult;
use super::evaluate::{evaluate, EvaluationResult};
use super::histogram::{split_histograms, SplitHistograms};
use super::labels::{binary_labels, count_labels, with_binary_label};
use super::loader::{parse_arff, Dataset};
use super::preprocess::{fit, Imputation, PreprocessConfig};
use super::split::{split, split_two, SplitSet};
use crate::store::SplitStore;

/// Result of the logistic regression job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticRunResult {
    pub accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub features_after_encoding: usize,
}

/// Result of the correlation job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub correlation: CorrelationMatrix,
    pub scatter: BTreeMap<String, Vec<f64>>,
}

/// Result of the split job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitResult {
    pub train_size: usize,
    pub val_size: usize,
    pub test_size: usize,
    pub histograms: SplitHistograms,
}

/// One preview row, serialized as an object keyed by column name in
/// column order
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow(pub Vec<(String, f64)>);

impl PreviewRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, v)| *v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PreviewRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Result of the preprocessing preview job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewResult {
    pub rows: usize,
    pub head: Vec<PreviewRow>,
}

/// Result of the full preprocessing pipeline job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullPipelineResult {
    /// Training rows left after noise injection and dropping incomplete rows
    pub train_rows: usize,
    pub val_rows: usize,
    pub test_rows: usize,
    pub features_after_pipeline: usize,
    /// First rows of the transformed training matrix, in feature order
    pub head: Vec<Vec<f64>>,
}

/// Missing ratio of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingRatio {
    pub column: String,
    pub ratio: f64,
}

/// Result of the describe job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeResult {
    pub summary: DatasetSummary,
    pub missing: Vec<MissingRatio>,
    pub normal_rows: usize,
    pub attack_rows: usize,
}

/// Hold-out predictions from a fitted classifier
struct HoldOut {
    train_samples: usize,
    features: usize,
    y_test: Vec<u8>,
    y_pred: Vec<u8>,
}

/// Split, fit preprocessing on the training part only, train and predict
fn classify_hold_out(dataset: &Dataset, test_fraction: f64, config: &JobConfig) -> PipelineResult<HoldOut> {
    let (train, test) = split_two(dataset, 1.0 - test_fraction, None, config.seed)?;

    let y_train = binary_labels(&train, &config.label)?;
    let y_test = binary_labels(&test, &config.label)?;
    let train_features = train.drop_column(&config.label.column)?;
    let test_features = test.drop_column(&config.label.column)?;

    let state = fit(&train_features, &config.classifier_preprocess)?;
    let x_train = state.transform(&train_features)?;
    let x_test = state.transform(&test_features)?;

    let model = config.classifier.fit(&x_train, &y_train)?;
    let y_pred = model.predict(&x_test)?;

    Ok(HoldOut {
        train_samples: x_train.nrows(),
        features: state.n_features(),
        y_test,
        y_pred,
    })
}

/// Train a logistic regression on an 80/20 hold-out and report its accuracy
pub fn run_logistic_regression(bytes: &[u8], config: &JobConfig) -> PipelineResult<LogisticRunResult> {
    let dataset = parse_arff(bytes)?;
    let hold_out = classify_hold_out(&dataset, config.logistic_test_fraction, config)?;
    let result = evaluate(&hold_out.y_test, &hold_out.y_pred)?;

    Ok(LogisticRunResult {
        accuracy: result.metrics.accuracy,
        train_samples: hold_out.train_samples,
        test_samples: hold_out.y_test.len(),
        features_after_encoding: hold_out.features,
    })
}

/// Train on a 70/30 hold-out and report the full metric set with the confusion matrix
pub fn evaluate_model(bytes: &[u8], config: &JobConfig) -> PipelineResult<EvaluationResult> {
    let dataset = parse_arff(bytes)?;
    let hold_out = classify_hold_out(&dataset, config.evaluation_test_fraction, config)?;
    evaluate(&hold_out.y_test, &hold_out.y_pred)
}

/// Pearson correlation over numeric columns (label mapped to 0/1) plus scatter pairs
pub fn correlation_analysis(bytes: &[u8], config: &JobConfig) -> PipelineResult<CorrelationResult> {
    let dataset = with_binary_label(&parse_arff(bytes)?, &config.label)?;

    Ok(CorrelationResult {
        correlation: correlation_matrix(&dataset, config.correlation_digits)?,
        scatter: scatter_pairs(&dataset, &config.scatter_x, &config.scatter_y)?,
    })
}

fn split_with_histograms(dataset: &Dataset, config: &JobConfig) -> PipelineResult<(SplitSet, SplitResult)> {
    let column = config.stratify_column.as_str();
    let splits = split(dataset, config.split, Some(column), config.seed)?;
    let (train_size, val_size, test_size) = splits.sizes();
    let histograms = split_histograms(&splits, column)?;

    Ok((
        splits,
        SplitResult {
            train_size,
            val_size,
            test_size,
            histograms,
        },
    ))
}

/// Stratified 60/20/20 split with per-split histograms of the stratify column
pub fn split_dataset(bytes: &[u8], config: &JobConfig) -> PipelineResult<SplitResult> {
    let dataset = parse_arff(bytes)?;
    Ok(split_with_histograms(&dataset, config)?.1)
}

/// Same as [`split_dataset`], additionally persisting the three splits
pub fn split_dataset_to_store(
    bytes: &[u8],
    config: &JobConfig,
    store: &SplitStore,
) -> PipelineResult<SplitResult> {
    let dataset = parse_arff(bytes)?;
    let (splits, result) = split_with_histograms(&dataset, config)?;
    store.persist(&splits)?;
    Ok(result)
}

/// Standardize the preview columns (missing values as 0) and show the first rows
pub fn preprocessing_preview(bytes: &[u8], config: &JobConfig) -> PipelineResult<PreviewResult> {
    let dataset = parse_arff(bytes)?;
    let columns: Vec<&str> = config.preview_columns.iter().map(String::as_str).collect();
    let selected = dataset.select_columns(&columns)?;
    for column in &columns {
        // fail fast on categorical preview columns
        selected.numeric_values(column)?;
    }

    let preview = PreprocessConfig::new(config.classifier_preprocess.scaler, Imputation::Zero);
    let state = fit(&selected, &preview)?;
    let matrix = state.transform(&selected)?;

    let head = matrix
        .head(config.head_rows, config.head_digits)
        .into_iter()
        .map(|row| PreviewRow(matrix.names().iter().cloned().zip(row).collect()))
        .collect();

    Ok(PreviewResult {
        rows: matrix.nrows(),
        head,
    })
}

/// Split, condition the training part, fit the robust pipeline on it and
/// apply the same state to validation and test.
///
/// Training rows made incomplete by noise injection are dropped before
/// fitting, so `train_rows` can be smaller than the training split.
pub fn full_pipeline(bytes: &[u8], config: &JobConfig) -> PipelineResult<FullPipelineResult> {
    let dataset = parse_arff(bytes)?;
    let splits = split(
        &dataset,
        config.split,
        Some(config.stratify_column.as_str()),
        config.seed,
    )?;

    let label = config.label.column.as_str();
    let train = splits.train.drop_column(label)?;
    let train = drop_incomplete_rows(&inject_noise(&train, &config.noise_rules)?)?;

    let state = fit(&train, &config.pipeline_preprocess)?;
    let x_train = state.transform(&train)?;
    let x_val = state.transform(&splits.validation.drop_column(label)?)?;
    let x_test = state.transform(&splits.test.drop_column(label)?)?;

    Ok(FullPipelineResult {
        train_rows: x_train.nrows(),
        val_rows: x_val.nrows(),
        test_rows: x_test.nrows(),
        features_after_pipeline: x_train.ncols(),
        head: x_train.head(config.head_rows, config.head_digits),
    })
}

/// Column statistics, missing ratios and label balance
pub fn describe_dataset(bytes: &[u8], config: &JobConfig) -> PipelineResult<DescribeResult> {
    let dataset = parse_arff(bytes)?;
    let (attack_rows, normal_rows) = count_labels(&dataset, &config.label)?;

    Ok(DescribeResult {
        summary: describe(&dataset, config.head_digits)?,
        missing: analyze_missing_values(&dataset)
            .into_iter()
            .map(|(column, ratio)| MissingRatio { column, ratio })
            .collect(),
        normal_rows,
        attack_rows,
    })
}
