//! Feature encoding, imputation and scaling
//!
//! Preprocessing is split into two phases. [`fit`] reads the training table
//! once and freezes everything it learned (fill values, scaling statistics,
//! category vocabularies) into an immutable [`FittedState`]. The state's
//! [`FittedState::transform`] then turns any table with the same columns
//! into a numeric [`FeatureMatrix`]. Because `transform` only borrows the
//! state, statistics from validation or test data can never leak back into it.
//!
//! Output column order: numeric columns in table order, then each
//! categorical column in table order expanded to its sorted vocabulary.

use std::collections::BTreeSet;
use std::fmt;

use faer::Mat;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::loader::Dataset;

/// Rescaling applied to numeric columns after imputation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalerKind {
    /// Subtract the mean, divide by the (population) standard deviation
    #[default]
    Standard,
    /// Subtract the median, divide by the interquartile range
    Robust,
}

impl fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalerKind::Standard => write!(f, "standard"),
            ScalerKind::Robust => write!(f, "robust"),
        }
    }
}

impl std::str::FromStr for ScalerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ScalerKind::Standard),
            "robust" => Ok(ScalerKind::Robust),
            _ => Err(format!("Unknown scaler: '{}'. Use 'standard' or 'robust'.", s)),
        }
    }
}

/// Fill strategy for missing numeric values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Imputation {
    /// Training-set median (resists outliers)
    #[default]
    Median,
    /// Constant zero
    Zero,
}

/// Caller-selected preprocessing options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub scaler: ScalerKind,
    pub imputation: Imputation,
}

impl PreprocessConfig {
    pub fn new(scaler: ScalerKind, imputation: Imputation) -> Self {
        Self { scaler, imputation }
    }
}

/// Frozen statistics for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub column: String,
    /// Value substituted for missing entries
    pub fill: f64,
    /// Subtracted before scaling (mean or median)
    pub center: f64,
    /// Divisor (standard deviation or IQR); 1.0 for constant columns
    pub scale: f64,
}

impl NumericStats {
    #[inline]
    fn apply(&self, value: Option<f64>) -> f64 {
        (value.unwrap_or(self.fill) - self.center) / self.scale
    }
}

/// Fit-time vocabulary of one categorical column, sorted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryVocabulary {
    pub column: String,
    pub categories: Vec<String>,
}

/// Everything learned from the training table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedState {
    config: PreprocessConfig,
    numeric: Vec<NumericStats>,
    categorical: Vec<CategoryVocabulary>,
}

/// Dense numeric matrix with named columns
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    values: Mat<f64>,
    names: Vec<String>,
}

impl FeatureMatrix {
    pub fn new(values: Mat<f64>, names: Vec<String>) -> PipelineResult<Self> {
        if values.ncols() != names.len() {
            return Err(PipelineError::Schema(format!(
                "matrix has {} columns but {} names",
                values.ncols(),
                names.len()
            )));
        }
        Ok(Self { values, names })
    }

    pub fn values(&self) -> &Mat<f64> {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.values[(i, j)]).collect()
    }

    /// First `n` rows rounded to `digits` decimals
    pub fn head(&self, n: usize, digits: i32) -> Vec<Vec<f64>> {
        (0..n.min(self.nrows()))
            .map(|i| self.row(i).into_iter().map(|v| round_to(v, digits)).collect())
            .collect()
    }
}

/// Round half away from zero to `digits` decimals
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Learn imputation, scaling and vocabulary state from a training table.
///
/// Numeric columns are any primitive numeric dtype; categorical columns are
/// strings. Fails with a numeric error when a numeric column has no observed
/// value to derive statistics from.
pub fn fit(train: &Dataset, config: &PreprocessConfig) -> PipelineResult<FittedState> {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for attr in train.attributes() {
        if attr.kind.is_numeric() {
            let values = train.numeric_values(&attr.name)?;
            numeric.push(fit_numeric(&attr.name, &values, config)?);
        } else {
            let categories: BTreeSet<String> = train
                .string_values(&attr.name)?
                .into_iter()
                .flatten()
                .collect();
            categorical.push(CategoryVocabulary {
                column: attr.name.clone(),
                categories: categories.into_iter().collect(),
            });
        }
    }

    Ok(FittedState {
        config: *config,
        numeric,
        categorical,
    })
}

/// Fit on `train` and transform it in one step
pub fn fit_transform(
    train: &Dataset,
    config: &PreprocessConfig,
) -> PipelineResult<(FittedState, FeatureMatrix)> {
    let state = fit(train, config)?;
    let matrix = state.transform(train)?;
    Ok((state, matrix))
}

fn fit_numeric(
    column: &str,
    values: &[Option<f64>],
    config: &PreprocessConfig,
) -> PipelineResult<NumericStats> {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.is_empty() {
        return Err(PipelineError::Numeric(format!(
            "column '{}' has no observed values in the training data",
            column
        )));
    }

    let fill = match config.imputation {
        Imputation::Median => median(&observed),
        Imputation::Zero => 0.0,
    };

    let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();

    let (center, spread) = match config.scaler {
        ScalerKind::Standard => mean_std(&imputed),
        ScalerKind::Robust => {
            let sorted = sorted_copy(&imputed);
            (
                quantile_sorted(&sorted, 0.5),
                quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25),
            )
        }
    };

    if !fill.is_finite() || !center.is_finite() || !spread.is_finite() {
        return Err(PipelineError::Numeric(format!(
            "column '{}' produced non-finite {} statistics",
            column, config.scaler
        )));
    }

    // constant columns pass through centered but unscaled
    let scale = if spread == 0.0 { 1.0 } else { spread };

    Ok(NumericStats {
        column: column.to_string(),
        fill,
        center,
        scale,
    })
}

impl FittedState {
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn numeric(&self) -> &[NumericStats] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[CategoryVocabulary] {
        &self.categorical
    }

    /// Width of every matrix this state produces
    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|v| v.categories.len())
                .sum::<usize>()
    }

    /// Output column names, `<column>_<category>` for one-hot columns
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|s| s.column.clone()).collect();
        for vocab in &self.categorical {
            for category in &vocab.categories {
                names.push(format!("{}_{}", vocab.column, category));
            }
        }
        names
    }

    /// Encode a table with the frozen state.
    ///
    /// Every fitted column must be present with a compatible type; extra
    /// columns are ignored. Categories unseen at fit time (and missing
    /// values) produce an all-zero block.
    pub fn transform(&self, dataset: &Dataset) -> PipelineResult<FeatureMatrix> {
        let nrows = dataset.height();
        let mut values = Mat::<f64>::zeros(nrows, self.n_features());

        for (j, stats) in self.numeric.iter().enumerate() {
            let column = dataset.numeric_values(&stats.column)?;
            for (i, v) in column.into_iter().enumerate() {
                values[(i, j)] = stats.apply(v);
            }
        }

        let mut offset = self.numeric.len();
        for vocab in &self.categorical {
            let column = dataset.string_values(&vocab.column)?;
            for (i, v) in column.iter().enumerate() {
                let Some(v) = v else { continue };
                if let Ok(pos) = vocab.categories.binary_search(v) {
                    values[(i, offset + pos)] = 1.0;
                }
            }
            offset += vocab.categories.len();
        }

        FeatureMatrix::new(values, self.feature_names())
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Quantile with linear interpolation between closest ranks
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub(crate) fn median(values: &[f64]) -> f64 {
    quantile_sorted(&sorted_copy(values), 0.5)
}

/// Mean and population standard deviation
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
