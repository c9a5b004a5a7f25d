//! Binary label derivation
//!
//! The intrusion datasets carry a categorical `class` column whose domain is
//! "normal" plus one or more attack names. Every downstream classifier and
//! metric works on the derived binary label: 0 for the normal value, 1 for
//! anything else (including a missing label).

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::loader::{Attribute, AttributeType, Dataset};

/// Which column holds the label and which of its values maps to 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelMapping {
    /// Name of the label column
    pub column: String,
    /// Value that maps to 0 (non-event); every other value maps to 1
    pub normal_value: String,
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self {
            column: "class".to_string(),
            normal_value: "normal".to_string(),
        }
    }
}

impl LabelMapping {
    pub fn new(column: impl Into<String>, normal_value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            normal_value: normal_value.into(),
        }
    }

    /// Map a single raw label to 0/1
    pub fn encode(&self, raw: Option<&str>) -> u8 {
        match raw {
            Some(v) if v == self.normal_value => 0,
            _ => 1,
        }
    }
}

/// Derive the binary label vector for every row
pub fn binary_labels(dataset: &Dataset, mapping: &LabelMapping) -> PipelineResult<Vec<u8>> {
    let values = dataset.string_values(&mapping.column).map_err(|_| {
        PipelineError::Schema(format!(
            "label column '{}' must exist and be categorical",
            mapping.column
        ))
    })?;

    Ok(values
        .iter()
        .map(|v| mapping.encode(v.as_deref()))
        .collect())
}

/// Replace the label column with its numeric 0/1 encoding, in place in the column order
pub fn with_binary_label(dataset: &Dataset, mapping: &LabelMapping) -> PipelineResult<Dataset> {
    let labels: Vec<f64> = binary_labels(dataset, mapping)?
        .into_iter()
        .map(f64::from)
        .collect();

    let mut frame = dataset.frame().clone();
    frame.with_column(Column::new(mapping.column.as_str().into(), labels))?;

    let attributes = dataset
        .attributes()
        .iter()
        .map(|a| {
            if a.name == mapping.column {
                Attribute {
                    name: a.name.clone(),
                    kind: AttributeType::Numeric,
                }
            } else {
                a.clone()
            }
        })
        .collect();

    Dataset::new(dataset.relation(), attributes, frame)
}

/// Count (events, non_events) under the mapping
pub fn count_labels(dataset: &Dataset, mapping: &LabelMapping) -> PipelineResult<(usize, usize)> {
    let labels = binary_labels(dataset, mapping)?;
    let events = labels.iter().filter(|&&y| y == 1).count();
    Ok((events, labels.len() - events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let frame = df! {
            "duration" => [0.0f64, 1.0, 2.0, 3.0],
            "class" => [Some("normal"), Some("neptune"), None, Some("normal")],
        }
        .unwrap();
        Dataset::from_frame("t", frame).unwrap()
    }

    #[test]
    fn test_binary_labels_total_mapping() {
        let labels = binary_labels(&sample(), &LabelMapping::default()).unwrap();
        // a missing label is not "normal", so it maps to 1
        assert_eq!(labels, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_custom_normal_value() {
        let mapping = LabelMapping::new("class", "neptune");
        let labels = binary_labels(&sample(), &mapping).unwrap();
        assert_eq!(labels, vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_with_binary_label_keeps_column_order() {
        let ds = with_binary_label(&sample(), &LabelMapping::default()).unwrap();
        let names: Vec<&str> = ds.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["duration", "class"]);
        assert_eq!(ds.attribute("class").unwrap().kind, AttributeType::Numeric);
        assert_eq!(
            ds.numeric_values("class").unwrap(),
            vec![Some(0.0), Some(1.0), Some(1.0), Some(0.0)]
        );
    }

    #[test]
    fn test_missing_label_column_is_schema_error() {
        let mapping = LabelMapping::new("label", "normal");
        let err = binary_labels(&sample(), &mapping).unwrap_err();
        assert_eq!(err.kind(), "schema_error");
    }

    #[test]
    fn test_count_labels() {
        let (events, non_events) = count_labels(&sample(), &LabelMapping::default()).unwrap();
        assert_eq!(events, 2);
        assert_eq!(non_events, 2);
    }
}
