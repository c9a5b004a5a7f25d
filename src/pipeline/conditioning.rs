//! Dataset conditioning before preprocessing
//!
//! A deliberate noise-injection step blanks mid-range values of selected
//! numeric columns, then rows left incomplete are dropped. This is a data
//! policy used by the full-pipeline job, not part of the general transform.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::loader::{column_as_f64, Dataset};

/// Blank every value of `column` strictly between `lower` and `upper`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseRule {
    pub column: String,
    pub lower: f64,
    pub upper: f64,
}

impl NoiseRule {
    pub fn new(column: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            column: column.into(),
            lower,
            upper,
        }
    }

    fn blanks(&self, value: f64) -> bool {
        value > self.lower && value < self.upper
    }
}

/// Default rules: `src_bytes` in (400, 800) and `dst_bytes` in (500, 2000)
pub fn default_noise_rules() -> Vec<NoiseRule> {
    vec![
        NoiseRule::new("src_bytes", 400.0, 800.0),
        NoiseRule::new("dst_bytes", 500.0, 2000.0),
    ]
}

/// Apply each rule in turn, returning a new dataset with the blanked values as nulls
pub fn inject_noise(dataset: &Dataset, rules: &[NoiseRule]) -> PipelineResult<Dataset> {
    let mut frame = dataset.frame().clone();

    for rule in rules {
        if rule.lower >= rule.upper {
            return Err(PipelineError::Numeric(format!(
                "noise range for '{}' is empty: ({}, {})",
                rule.column, rule.lower, rule.upper
            )));
        }

        if !dataset.attribute(&rule.column)?.kind.is_numeric() {
            return Err(PipelineError::Schema(format!(
                "noise rule targets non-numeric column '{}'",
                rule.column
            )));
        }

        // read from the working frame so rules on the same column compose
        let blanked: Vec<Option<f64>> = column_as_f64(frame.column(rule.column.as_str())?)?
            .into_iter()
            .map(|v| v.filter(|&x| !rule.blanks(x)))
            .collect();

        frame.with_column(Column::new(rule.column.as_str().into(), blanked))?;
    }

    dataset.with_frame(frame)
}

/// Keep only rows without any missing value
pub fn drop_incomplete_rows(dataset: &Dataset) -> PipelineResult<Dataset> {
    let height = dataset.height();
    let mut complete = vec![true; height];

    for col in dataset.frame().get_columns() {
        if col.null_count() == 0 {
            continue;
        }
        for (row, val) in col.as_materialized_series().iter().enumerate() {
            if val.is_null() {
                complete[row] = false;
            }
        }
    }

    let keep: Vec<IdxSize> = complete
        .iter()
        .enumerate()
        .filter(|(_, &ok)| ok)
        .map(|(row, _)| row as IdxSize)
        .collect();

    dataset.take_rows(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traffic() -> Dataset {
        let frame = df! {
            "src_bytes" => [Some(100.0f64), Some(500.0), Some(800.0), None, Some(450.0)],
            "dst_bytes" => [0.0f64, 1000.0, 2000.0, 10.0, 0.0],
            "flag" => ["SF", "SF", "REJ", "SF", "S0"],
        }
        .unwrap();
        Dataset::from_frame("t", frame).unwrap()
    }

    #[test]
    fn test_inject_noise_blanks_open_interval() {
        let ds = inject_noise(&traffic(), &default_noise_rules()).unwrap();
        assert_eq!(
            ds.numeric_values("src_bytes").unwrap(),
            vec![Some(100.0), None, Some(800.0), None, None]
        );
        // 2000 sits on the boundary and is kept
        assert_eq!(
            ds.numeric_values("dst_bytes").unwrap(),
            vec![Some(0.0), None, Some(2000.0), Some(10.0), Some(0.0)]
        );
    }

    #[test]
    fn test_inject_noise_leaves_source_untouched() {
        let source = traffic();
        let _ = inject_noise(&source, &default_noise_rules()).unwrap();
        assert_eq!(source.numeric_values("src_bytes").unwrap()[1], Some(500.0));
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let ds = inject_noise(&traffic(), &default_noise_rules()).unwrap();
        let complete = drop_incomplete_rows(&ds).unwrap();
        assert_eq!(complete.height(), 2);
        assert_eq!(
            complete.string_values("flag").unwrap(),
            vec![Some("SF".to_string()), Some("REJ".to_string())]
        );
    }

    #[test]
    fn test_noise_on_missing_column_fails() {
        let rules = vec![NoiseRule::new("duration", 0.0, 1.0)];
        assert!(inject_noise(&traffic(), &rules).is_err());
    }
}
