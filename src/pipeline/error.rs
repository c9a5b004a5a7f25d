//! Error types shared by every pipeline stage.
//!
//! Each variant carries a human-readable message. The external caller maps
//! the `kind()` tag onto whatever failure representation it needs; the core
//! never terminates the process.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while loading, splitting, transforming or scoring a dataset.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input is not a well-formed ARFF document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An expected column is missing or has the wrong type.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stratification group (or the whole table) is too small for the request.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A statistic could not be computed (e.g. a column with no observed values).
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Failure reported by the underlying data frame engine.
    #[error(transparent)]
    Polars(#[from] PolarsError),

    /// Failure reading or writing persisted split artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable tag identifying the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "parse_error",
            PipelineError::Schema(_) => "schema_error",
            PipelineError::InsufficientData(_) => "insufficient_data_error",
            PipelineError::Numeric(_) => "numeric_error",
            PipelineError::Polars(_) => "engine_error",
            PipelineError::Io(_) => "io_error",
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        PipelineError::Parse(format!("line {}: {}", line, message.into()))
    }
}

/// Convenience alias used throughout the pipeline.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(PipelineError::Parse("x".into()).kind(), "parse_error");
        assert_eq!(PipelineError::Schema("x".into()).kind(), "schema_error");
        assert_eq!(
            PipelineError::InsufficientData("x".into()).kind(),
            "insufficient_data_error"
        );
        assert_eq!(PipelineError::Numeric("x".into()).kind(), "numeric_error");
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = PipelineError::parse(12, "row has 3 values, expected 4");
        assert_eq!(
            err.to_string(),
            "Parse error: line 12: row has 3 values, expected 4"
        );
    }
}
