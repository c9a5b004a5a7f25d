//! Pipeline module - dataset stages and the jobs that compose them

pub mod classifier;
pub mod conditioning;
pub mod config;
pub mod correlation;
pub mod describe;
pub mod error;
pub mod evaluate;
pub mod histogram;
pub mod jobs;
pub mod labels;
pub mod loader;
pub mod preprocess;
pub mod split;

pub use classifier::{LogisticModel, LogisticRegression};
pub use conditioning::*;
pub use config::*;
pub use correlation::*;
pub use describe::*;
pub use error::*;
pub use evaluate::*;
pub use histogram::*;
pub use jobs::*;
pub use labels::*;
pub use loader::*;
pub use preprocess::*;
pub use split::*;
