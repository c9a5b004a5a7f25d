//! Pearson correlation report and scatter extraction

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, PipelineResult};
use super::loader::Dataset;
use super::preprocess::round_to;

/// Square correlation matrix over the numeric columns of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Look up the coefficient for two named columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.matrix[i][j])
    }
}

/// Represents a correlated pair of features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Pearson correlation between every pair of numeric columns.
///
/// Each pair uses the rows where both values are present. Undefined
/// coefficients (constant columns, fewer than two shared rows) are reported
/// as 0, including on the diagonal. Values are rounded to `digits` decimals.
pub fn correlation_matrix(dataset: &Dataset, digits: i32) -> PipelineResult<CorrelationMatrix> {
    let numeric: Vec<(String, Vec<Option<f64>>)> = dataset
        .attributes()
        .iter()
        .filter(|a| a.kind.is_numeric())
        .map(|a| Ok((a.name.clone(), dataset.numeric_values(&a.name)?)))
        .collect::<PipelineResult<_>>()?;

    let n = numeric.len();

    // Upper triangle including the diagonal
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i..n).map(move |j| (i, j)))
        .collect();

    let coefficients: Vec<(usize, usize, f64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let r = pearson(&numeric[i].1, &numeric[j].1).unwrap_or(0.0);
            (i, j, round_to(r, digits))
        })
        .collect();

    let mut matrix = vec![vec![0.0; n]; n];
    for (i, j, r) in coefficients {
        matrix[i][j] = r;
        matrix[j][i] = r;
    }

    Ok(CorrelationMatrix {
        columns: numeric.into_iter().map(|(name, _)| name).collect(),
        matrix,
    })
}

/// Pearson correlation over pairwise-complete observations.
///
/// Uses a single-pass Welford update for numerical stability. Returns `None`
/// when fewer than two rows are shared or either side is constant.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }

    let mut count = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (a, b) in x.iter().zip(y) {
        if let (Some(a), Some(b)) = (a, b) {
            count += 1.0;
            let dx = a - mean_x;
            let dy = b - mean_y;
            mean_x += dx / count;
            mean_y += dy / count;
            var_x += dx * (a - mean_x);
            var_y += dy * (b - mean_y);
            cov_xy += dx * (b - mean_y);
        }
    }

    if count < 2.0 || var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov_xy / (var_x.sqrt() * var_y.sqrt());
    if r.is_nan() {
        None
    } else {
        // guard against rounding just outside [-1, 1]
        Some(r.clamp(-1.0, 1.0))
    }
}

/// Off-diagonal pairs whose absolute coefficient exceeds `threshold`,
/// sorted by absolute correlation descending
pub fn correlated_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let n = matrix.columns.len();
    let mut pairs = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let corr = matrix.matrix[i][j];
            if corr.abs() > threshold {
                pairs.push(CorrelatedPair {
                    feature1: matrix.columns[i].clone(),
                    feature2: matrix.columns[j].clone(),
                    correlation: corr,
                });
            }
        }
    }

    pairs.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    pairs
}

/// Values of two numeric columns as parallel sequences, missing values filled with 0
pub fn scatter_pairs(
    dataset: &Dataset,
    column_a: &str,
    column_b: &str,
) -> PipelineResult<BTreeMap<String, Vec<f64>>> {
    let mut out = BTreeMap::new();
    for column in [column_a, column_b] {
        let values = dataset.numeric_values(column).map_err(|e| match e {
            PipelineError::Schema(msg) => {
                PipelineError::Schema(format!("scatter column unavailable: {}", msg))
            }
            other => other,
        })?;
        out.insert(
            column.to_string(),
            values.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> Dataset {
        let frame = df! {
            "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
            "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0],
            "c" => [5.0f64, 4.0, 3.0, 2.0, 1.0],
            "k" => [3.0f64, 3.0, 3.0, 3.0, 3.0],
            "p" => ["tcp", "udp", "tcp", "icmp", "tcp"],
        }
        .unwrap();
        Dataset::from_frame("t", frame).unwrap()
    }

    #[test]
    fn test_only_numeric_columns_in_order() {
        let m = correlation_matrix(&sample(), 3).unwrap();
        assert_eq!(m.columns, vec!["a", "b", "c", "k"]);
        assert_eq!(m.matrix.len(), 4);
    }

    #[test]
    fn test_diagonal_and_symmetry() {
        let m = correlation_matrix(&sample(), 3).unwrap();
        assert_eq!(m.get("a", "a"), Some(1.0));
        assert_eq!(m.get("a", "b"), Some(1.0));
        assert_eq!(m.get("a", "c"), Some(-1.0));
        for i in 0..m.columns.len() {
            for j in 0..m.columns.len() {
                assert_eq!(m.matrix[i][j], m.matrix[j][i]);
            }
        }
    }

    #[test]
    fn test_constant_column_reports_zero() {
        let m = correlation_matrix(&sample(), 3).unwrap();
        assert_eq!(m.get("k", "a"), Some(0.0));
        assert_eq!(m.get("k", "k"), Some(0.0));
    }

    #[test]
    fn test_pearson_skips_missing_pairs() {
        let x = [Some(1.0), Some(2.0), None, Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        let r = pearson(&x, &y).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
    }

    #[test]
    fn test_correlated_pairs_sorted() {
        let m = correlation_matrix(&sample(), 3).unwrap();
        let pairs = correlated_pairs(&m, 0.9);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|p| p.correlation.abs() > 0.9));
    }

    #[test]
    fn test_scatter_fills_missing_with_zero() {
        let frame = df! {
            "same_srv_rate" => [Some(0.5f64), None],
            "dst_host_srv_count" => [Some(10.0f64), Some(3.0)],
        }
        .unwrap();
        let ds = Dataset::from_frame("t", frame).unwrap();
        let scatter = scatter_pairs(&ds, "same_srv_rate", "dst_host_srv_count").unwrap();
        assert_eq!(scatter["same_srv_rate"], vec![0.5, 0.0]);
        assert_eq!(scatter["dst_host_srv_count"], vec![10.0, 3.0]);
    }

    #[test]
    fn test_scatter_missing_column_is_schema_error() {
        let err = scatter_pairs(&sample(), "a", "nope").unwrap_err();
        assert_eq!(err.kind(), "schema_error");
    }
}
