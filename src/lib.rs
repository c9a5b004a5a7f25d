//! kddlab: NSL-KDD intrusion dataset analysis
//!
//! Loads ARFF network-connection records and runs request-scoped jobs over
//! them: stratified splitting, preprocessing, logistic regression with
//! evaluation, and correlation and histogram reports.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod utils;
