//! Descriptive statistics and missing value analysis

use serde::Serialize;

use super::error::PipelineResult;
use super::histogram::value_counts;
use super::loader::Dataset;
use super::preprocess::{mean_std, median, round_to};

/// Summary of one numeric column over its observed values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// Summary of one categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub distinct: usize,
    /// Most frequent value and its count
    pub top: Option<(String, usize)>,
}

/// Descriptive statistics for a whole table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

/// Missing ratio per column, sorted descending
pub fn analyze_missing_values(dataset: &Dataset) -> Vec<(String, f64)> {
    let rows = dataset.height();
    if rows == 0 {
        return Vec::new();
    }

    let mut missing_ratios: Vec<(String, f64)> = dataset
        .frame()
        .get_columns()
        .iter()
        .map(|col| {
            (
                col.name().to_string(),
                col.null_count() as f64 / rows as f64,
            )
        })
        .collect();

    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    missing_ratios
}

/// Count, mean, std (population), min, median and max per numeric column;
/// count, distinct and mode per categorical column. Floats are rounded to `digits`.
pub fn describe(dataset: &Dataset, digits: i32) -> PipelineResult<DatasetSummary> {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for attr in dataset.attributes() {
        if attr.kind.is_numeric() {
            let values = dataset.numeric_values(&attr.name)?;
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            let present = !observed.is_empty();
            let (mean, std) = mean_std(&observed);
            let rounded = |v: f64| present.then(|| round_to(v, digits));

            numeric.push(NumericSummary {
                column: attr.name.clone(),
                count: observed.len(),
                missing: values.len() - observed.len(),
                mean: rounded(mean),
                std: rounded(std),
                min: rounded(observed.iter().copied().fold(f64::INFINITY, f64::min)),
                median: rounded(median(&observed)),
                max: rounded(observed.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            });
        } else {
            let histogram = value_counts(dataset, &attr.name)?;
            let count = histogram.total();
            categorical.push(CategoricalSummary {
                column: attr.name.clone(),
                count,
                missing: dataset.height() - count,
                distinct: histogram.labels.len(),
                top: histogram
                    .labels
                    .first()
                    .map(|label| (label.clone(), histogram.values[0])),
            });
        }
    }

    Ok(DatasetSummary {
        rows: dataset.height(),
        columns: dataset.attributes().len(),
        numeric,
        categorical,
    })
}
