//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable log levels
//! - JSON-formatted local file logging with rotation
//! - Run lifecycle macros shared by the anonymization and transformation engines
//!
//! # Example
//!
//! ```no_run
//! use sieve::logging::init_logging;
//! use sieve::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an engine run
///
/// # Example
///
/// ```no_run
/// use sieve::log_run_start;
///
/// log_run_start!("anonymize", 1000, 4);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($engine:expr, $rows:expr, $rules:expr) => {
        tracing::info!(
            engine = $engine,
            rows = $rows,
            rules = $rules,
            "Starting run"
        );
    };
}

/// Log the completion of an engine run
///
/// # Example
///
/// ```no_run
/// use sieve::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!("transform", 980, Duration::from_millis(35));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($engine:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            engine = $engine,
            rows = $rows,
            duration_ms = $duration.as_millis() as u64,
            "Run completed"
        );
    };
}

/// Log one pipeline rule having been applied
///
/// # Example
///
/// ```no_run
/// use sieve::log_rule_applied;
///
/// log_rule_applied!("rule-1", "convert", 250);
/// ```
#[macro_export]
macro_rules! log_rule_applied {
    ($rule_id:expr, $rule_type:expr, $rows:expr) => {
        tracing::debug!(
            rule_id = %$rule_id,
            rule_type = %$rule_type,
            rows = $rows,
            "Rule applied"
        );
    };
}

/// Log progress through a batch of rows
///
/// # Example
///
/// ```no_run
/// use sieve::log_batch_progress;
///
/// log_batch_progress!(500, 2000);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing batch"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sieve::log_error_with_context;
/// use sieve::domain::SieveError;
///
/// let error = SieveError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
