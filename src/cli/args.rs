//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// kddlab - Analyse NSL-KDD intrusion records stored as ARFF
#[derive(Parser, Debug)]
#[command(name = "kddlab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every job
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Input ARFF file
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON file overriding job defaults (split ratios, scaler, noise rules, ...)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for every shuffle; overrides the config file
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the JSON result here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only print the JSON result, no banner or tables
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a logistic regression on an 80/20 hold-out and report accuracy
    Logistic(JobArgs),

    /// Pearson correlation of the numeric columns plus scatter pairs
    Correlation(JobArgs),

    /// Stratified 60/20/20 split with per-split histograms
    Split {
        #[command(flatten)]
        job: JobArgs,

        /// Persist the three splits as ARFF files in this directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Standardize src_bytes and dst_bytes and show the first rows
    Preprocess(JobArgs),

    /// Split, inject noise, impute and robust-scale; report the resulting shapes
    Pipeline(JobArgs),

    /// Train on a 70/30 hold-out and report accuracy, precision, recall, F1
    Evaluate(JobArgs),

    /// Column statistics, missing ratios and label balance
    Describe(JobArgs),

    /// Copy a persisted split out of a store directory
    Download {
        /// Which split to fetch
        #[arg(value_enum)]
        split: SplitName,

        /// Directory the splits were persisted to
        #[arg(long)]
        store: PathBuf,

        /// Destination file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitName {
    Train,
    Val,
    Test,
}

impl SplitName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Val => "val",
            SplitName::Test => "test",
        }
    }
}

impl Commands {
    /// Short job name used in headers and exports
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Logistic(_) => "logistic",
            Commands::Correlation(_) => "correlation",
            Commands::Split { .. } => "split",
            Commands::Preprocess(_) => "preprocess",
            Commands::Pipeline(_) => "pipeline",
            Commands::Evaluate(_) => "evaluate",
            Commands::Describe(_) => "describe",
            Commands::Download { .. } => "download",
        }
    }

    /// Shared job options, `None` for commands that do not run a job
    pub fn job_args(&self) -> Option<&JobArgs> {
        match self {
            Commands::Logistic(args)
            | Commands::Correlation(args)
            | Commands::Preprocess(args)
            | Commands::Pipeline(args)
            | Commands::Evaluate(args)
            | Commands::Describe(args) => Some(args),
            Commands::Split { job, .. } => Some(job),
            Commands::Download { .. } => None,
        }
    }
}
