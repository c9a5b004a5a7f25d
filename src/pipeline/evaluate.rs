//! Binary classification metrics

use serde::Serialize;

use super::error::{PipelineError, PipelineResult};
use super::preprocess::round_to;

/// Decimal digits kept in reported rates
const RATE_DIGITS: i32 = 4;

/// Confusion matrix cells for a 0/1 label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

/// Rates reported for a set of predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub metrics: Metrics,
    pub confusion_matrix: ConfusionMatrix,
}

/// Count tn/fp/fn/tp. Any non-zero label counts as positive.
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> PipelineResult<ConfusionMatrix> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::Schema(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }

    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t != 0, p != 0) {
            (false, false) => cm.tn += 1,
            (false, true) => cm.fp += 1,
            (true, false) => cm.fn_ += 1,
            (true, true) => cm.tp += 1,
        }
    }
    Ok(cm)
}

/// `num / den`, or 0 when the denominator is zero
#[inline]
fn safe_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Accuracy, precision, recall and F1 (rounded) plus the confusion matrix.
///
/// A zero denominator yields 0 for that rate rather than an error.
pub fn evaluate(y_true: &[u8], y_pred: &[u8]) -> PipelineResult<EvaluationResult> {
    let cm = confusion_matrix(y_true, y_pred)?;
    let (tn, fp, fn_, tp) = (cm.tn as f64, cm.fp as f64, cm.fn_ as f64, cm.tp as f64);

    let accuracy = safe_ratio(tp + tn, cm.total() as f64);
    let precision = safe_ratio(tp, tp + fp);
    let recall = safe_ratio(tp, tp + fn_);
    let f1 = safe_ratio(2.0 * precision * recall, precision + recall);

    Ok(EvaluationResult {
        metrics: Metrics {
            accuracy: round_to(accuracy, RATE_DIGITS),
            precision: round_to(precision, RATE_DIGITS),
            recall: round_to(recall, RATE_DIGITS),
            f1: round_to(f1, RATE_DIGITS),
        },
        confusion_matrix: cm,
    })
}
