//! On-disk store for persisted splits
//!
//! A split run can write its three subsets as ARFF files under one
//! directory; they are retrieved later by name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::loader::write_arff;
use crate::pipeline::split::SplitSet;

/// Names under which splits are stored
pub const SPLIT_NAMES: [&str; 3] = ["train", "val", "test"];

#[derive(Debug, Clone)]
pub struct SplitStore {
    root: PathBuf,
}

impl SplitStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a stored split, `None` for names other than train/val/test
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        SPLIT_NAMES
            .contains(&name)
            .then(|| self.root.join(format!("{}.arff", name)))
    }

    /// Write the three subsets, replacing earlier ones
    pub fn persist(&self, splits: &SplitSet) -> PipelineResult<()> {
        fs::create_dir_all(&self.root)?;
        for (name, dataset) in SPLIT_NAMES
            .iter()
            .zip([&splits.train, &splits.validation, &splits.test])
        {
            let path = self.root.join(format!("{}.arff", name));
            fs::write(path, write_arff(dataset)?)?;
        }
        Ok(())
    }

    /// Bytes of a stored split.
    ///
    /// `Ok(None)` for unknown names and for splits that were never persisted;
    /// other read failures are I/O errors.
    pub fn retrieve(&self, name: &str) -> PipelineResult<Option<Vec<u8>>> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::Io(io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::loader::{parse_arff, Dataset};
    use crate::pipeline::split::{split, SplitRatios};
    use polars::prelude::*;
    use tempfile::TempDir;

    fn splits() -> SplitSet {
        let frame = df! {
            "duration" => (0..20).map(|i| i as f64).collect::<Vec<_>>(),
            "class" => (0..20).map(|i| if i % 2 == 0 { "normal" } else { "neptune" }).collect::<Vec<_>>(),
        }
        .unwrap();
        let ds = Dataset::from_frame("kdd", frame).unwrap();
        split(&ds, SplitRatios::default(), Some("class"), 42).unwrap()
    }

    #[test]
    fn test_persist_then_retrieve() {
        let dir = TempDir::new().unwrap();
        let store = SplitStore::new(dir.path().join("splits"));
        let splits = splits();
        store.persist(&splits).unwrap();

        let bytes = store.retrieve("val").unwrap().unwrap();
        let restored = parse_arff(&bytes).unwrap();
        assert_eq!(restored.height(), splits.validation.height());
        assert_eq!(
            restored.numeric_values("duration").unwrap(),
            splits.validation.numeric_values("duration").unwrap()
        );
    }

    #[test]
    fn test_unknown_name_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SplitStore::new(dir.path());
        store.persist(&splits()).unwrap();
        assert!(store.retrieve("holdout").unwrap().is_none());
        assert!(store.retrieve("../train").unwrap().is_none());
    }

    #[test]
    fn test_unpersisted_split_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SplitStore::new(dir.path());
        assert!(store.retrieve("train").unwrap().is_none());
    }

    #[test]
    fn test_unreadable_split_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = SplitStore::new(dir.path());
        // a directory where the file should be
        std::fs::create_dir(dir.path().join("test.arff")).unwrap();
        let err = store.retrieve("test").unwrap_err();
        assert_eq!(err.kind(), "io_error");
    }
}
