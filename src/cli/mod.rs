//! CLI module - argument parsing and job execution

mod args;
pub mod run;

pub use args::{Cli, Commands, JobArgs, SplitName};
pub use run::*;
