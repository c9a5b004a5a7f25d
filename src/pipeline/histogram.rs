//! Category value counts per split

use std::collections::HashMap;

use serde::Serialize;

use super::error::PipelineResult;
use super::loader::Dataset;
use super::split::SplitSet;

/// Parallel label/count sequences, most frequent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.values.iter().sum()
    }

    /// Count for one label, 0 when absent
    pub fn count(&self, label: &str) -> usize {
        self.labels
            .iter()
            .position(|l| l == label)
            .map_or(0, |i| self.values[i])
    }
}

/// One histogram per split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitHistograms {
    pub train: Histogram,
    pub val: Histogram,
    pub test: Histogram,
}

/// Value counts of a categorical column.
///
/// Missing values are not counted. Ties keep first-appearance order.
pub fn value_counts(dataset: &Dataset, column: &str) -> PipelineResult<Histogram> {
    let values = dataset.string_values(column)?;

    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for v in values.iter().flatten() {
        let slot = *position.entry(v.as_str()).or_insert_with(|| {
            counts.push((v.clone(), 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    // stable sort keeps first-appearance order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let (labels, values) = counts.into_iter().unzip();
    Ok(Histogram { labels, values })
}

/// Value counts of `column` in each of the three splits
pub fn split_histograms(splits: &SplitSet, column: &str) -> PipelineResult<SplitHistograms> {
    Ok(SplitHistograms {
        train: value_counts(&splits.train, column)?,
        val: value_counts(&splits.validation, column)?,
        test: value_counts(&splits.test, column)?,
    })
}
