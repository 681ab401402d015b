//! Progress and report protocol shared by the anonymization and transformation engines
//!
//! - [`progress`] - bounded progress channel, suspension points, cancellation
//! - [`report`] - recovered per-row errors collected into engine reports

pub mod progress;
pub mod report;

pub use progress::{CancelPolicy, ProgressEvent, ProgressReporter, DEFAULT_BATCH_SIZE};
pub use report::{RowError, RowErrorKind};
