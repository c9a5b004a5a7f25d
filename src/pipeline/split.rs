//! Stratified train/validation/test splitting
//!
//! Rows are grouped by the value of a stratification column, each group is
//! shuffled with a seeded RNG and cut proportionally, and the pieces are
//! concatenated group by group. Two such cuts produce the three subsets.

use std::collections::HashMap;

use polars::prelude::IdxSize;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::loader::Dataset;

/// Fractions for the two successive cuts.
///
/// `first` is the share of the full table kept in the first subset;
/// `second` is the share of the remainder kept in the second subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub first: f64,
    pub second: f64,
}

impl SplitRatios {
    /// Ratios from train/validation/test proportions (need not sum to one)
    pub fn from_proportions(train: f64, validation: f64, test: f64) -> Self {
        let total = train + validation + test;
        let rest = validation + test;
        Self {
            first: if total > 0.0 { train / total } else { 0.0 },
            second: if rest > 0.0 { validation / rest } else { 0.0 },
        }
    }
}

impl Default for SplitRatios {
    /// 60/20/20
    fn default() -> Self {
        Self {
            first: 0.6,
            second: 0.5,
        }
    }
}

/// The three disjoint subsets produced by [`split`]
#[derive(Debug, Clone)]
pub struct SplitSet {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

impl SplitSet {
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.height(), self.validation.height(), self.test.height())
    }
}

/// Split into train/validation/test with two successive stratified cuts.
///
/// Both cuts use the same `seed`, so the result is fully reproducible.
/// The first cut leaves at least two rows of every group in the remainder,
/// so any group of three or more rows reaches all three subsets.
pub fn split(
    dataset: &Dataset,
    ratios: SplitRatios,
    stratify_column: Option<&str>,
    seed: u64,
) -> PipelineResult<SplitSet> {
    let (train, remainder) = cut(dataset, ratios.first, stratify_column, seed, 2)?;
    let (validation, test) = cut(&remainder, ratios.second, stratify_column, seed, 1)?;
    Ok(SplitSet {
        train,
        validation,
        test,
    })
}

/// One stratified cut: `ratio` of every group goes to the first part.
///
/// With no stratification column the whole table is a single group, which
/// reduces to a plain seeded shuffle split.
pub fn split_two(
    dataset: &Dataset,
    ratio: f64,
    stratify_column: Option<&str>,
    seed: u64,
) -> PipelineResult<(Dataset, Dataset)> {
    cut(dataset, ratio, stratify_column, seed, 1)
}

/// Stratified cut keeping at least one row of each group in the first part
/// and at least `keep_rest` rows of each group in the second part
fn cut(
    dataset: &Dataset,
    ratio: f64,
    stratify_column: Option<&str>,
    seed: u64,
    keep_rest: usize,
) -> PipelineResult<(Dataset, Dataset)> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(PipelineError::InsufficientData(format!(
            "split ratio must be strictly between 0 and 1, got {}",
            ratio
        )));
    }
    if dataset.is_empty() {
        return Err(PipelineError::InsufficientData(
            "cannot split an empty table".to_string(),
        ));
    }

    let keys = stratification_keys(dataset, stratify_column)?;
    let groups = group_rows(&keys);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut first: Vec<IdxSize> = Vec::with_capacity(dataset.height());
    let mut second: Vec<IdxSize> = Vec::with_capacity(dataset.height());

    for (key, mut rows) in groups {
        let n = rows.len();
        let needed = keep_rest + 1;
        if n < needed {
            return Err(PipelineError::InsufficientData(format!(
                "stratification group '{}' has {} row(s); at least {} are needed to split",
                key.as_deref().unwrap_or("<missing>"),
                n,
                needed
            )));
        }

        rows.shuffle(&mut rng);
        let take = ((n as f64) * ratio).round() as usize;
        let take = take.clamp(1, n - keep_rest);

        first.extend_from_slice(&rows[..take]);
        second.extend_from_slice(&rows[take..]);
    }

    Ok((dataset.take_rows(&first)?, dataset.take_rows(&second)?))
}

/// Stratification key per row; one shared key when not stratifying
fn stratification_keys(
    dataset: &Dataset,
    stratify_column: Option<&str>,
) -> PipelineResult<Vec<Option<String>>> {
    let Some(column) = stratify_column else {
        return Ok(vec![Some("<all>".to_string()); dataset.height()]);
    };

    if dataset.attribute(column)?.kind.is_numeric() {
        Ok(dataset
            .numeric_values(column)?
            .into_iter()
            .map(|v| v.map(|x| format!("{}", x)))
            .collect())
    } else {
        dataset.string_values(column)
    }
}

/// Row indices per key, groups in order of first appearance
fn group_rows(keys: &[Option<String>]) -> Vec<(Option<String>, Vec<IdxSize>)> {
    let mut position: HashMap<&Option<String>, usize> = HashMap::new();
    let mut groups: Vec<(Option<String>, Vec<IdxSize>)> = Vec::new();

    for (row, key) in keys.iter().enumerate() {
        let slot = *position.entry(key).or_insert_with(|| {
            groups.push((key.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row as IdxSize);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn labeled(normal: usize, attack: usize) -> Dataset {
        let n = normal + attack;
        let ids: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let class: Vec<&str> = (0..n)
            .map(|i| if i < normal { "normal" } else { "attack" })
            .collect();
        let frame = df! { "id" => ids, "class" => class }.unwrap();
        Dataset::from_frame("t", frame).unwrap()
    }

    fn count(ds: &Dataset, value: &str) -> usize {
        ds.string_values("class")
            .unwrap()
            .iter()
            .filter(|v| v.as_deref() == Some(value))
            .count()
    }

    #[test]
    fn test_split_two_preserves_group_proportions() {
        let ds = labeled(100, 50);
        let (a, b) = split_two(&ds, 0.6, Some("class"), 42).unwrap();
        assert_eq!(count(&a, "normal"), 60);
        assert_eq!(count(&a, "attack"), 30);
        assert_eq!(count(&b, "normal"), 40);
        assert_eq!(count(&b, "attack"), 20);
    }

    #[test]
    fn test_split_is_reproducible() {
        let ds = labeled(30, 20);
        let first = split(&ds, SplitRatios::default(), Some("class"), 7).unwrap();
        let again = split(&ds, SplitRatios::default(), Some("class"), 7).unwrap();
        assert_eq!(
            first.train.numeric_values("id").unwrap(),
            again.train.numeric_values("id").unwrap()
        );
        assert_eq!(
            first.test.numeric_values("id").unwrap(),
            again.test.numeric_values("id").unwrap()
        );
    }

    #[test]
    fn test_different_seed_changes_assignment() {
        let ds = labeled(50, 50);
        let a = split(&ds, SplitRatios::default(), Some("class"), 1).unwrap();
        let b = split(&ds, SplitRatios::default(), Some("class"), 2).unwrap();
        assert_ne!(
            a.train.numeric_values("id").unwrap(),
            b.train.numeric_values("id").unwrap()
        );
    }

    #[test]
    fn test_singleton_group_is_insufficient() {
        let ds = labeled(10, 1);
        let err = split_two(&ds, 0.5, Some("class"), 42).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data_error");
        assert!(err.to_string().contains("attack"));
    }

    #[test]
    fn test_three_row_group_reaches_every_subset() {
        let ds = labeled(20, 3);
        let splits = split(&ds, SplitRatios::default(), Some("class"), 42).unwrap();
        assert_eq!(count(&splits.train, "attack"), 1);
        assert_eq!(count(&splits.validation, "attack"), 1);
        assert_eq!(count(&splits.test, "attack"), 1);
    }

    #[test]
    fn test_small_groups_split_at_80_10_10() {
        let ratios = SplitRatios::from_proportions(80.0, 10.0, 10.0);
        for (attack, expected) in [(5, (3, 1, 1)), (6, (4, 1, 1)), (7, (5, 1, 1))] {
            let ds = labeled(40, attack);
            let splits = split(&ds, ratios, Some("class"), 42).unwrap();
            assert_eq!(
                (
                    count(&splits.train, "attack"),
                    count(&splits.validation, "attack"),
                    count(&splits.test, "attack"),
                ),
                expected
            );
        }
    }

    #[test]
    fn test_two_row_group_cannot_fill_three_subsets() {
        let ds = labeled(20, 2);
        let err = split(&ds, SplitRatios::default(), Some("class"), 42).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data_error");
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_unstratified_split_sizes() {
        let ds = labeled(90, 10);
        let (a, b) = split_two(&ds, 0.8, None, 42).unwrap();
        assert_eq!(a.height(), 80);
        assert_eq!(b.height(), 20);
    }

    #[test]
    fn test_ratios_from_proportions() {
        let r = SplitRatios::from_proportions(60.0, 20.0, 20.0);
        assert!((r.first - 0.6).abs() < 1e-12);
        assert!((r.second - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let ds = labeled(10, 10);
        assert!(split_two(&ds, 1.0, Some("class"), 42).is_err());
        assert!(split_two(&ds, 0.0, Some("class"), 42).is_err());
    }

    #[test]
    fn test_missing_stratify_column_is_schema_error() {
        let ds = labeled(10, 10);
        let err = split_two(&ds, 0.5, Some("protocol_type"), 42).unwrap_err();
        assert_eq!(err.kind(), "schema_error");
    }
}
