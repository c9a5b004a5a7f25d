//! Report module - summary tables and JSON export of job results

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
