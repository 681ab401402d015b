//! Configuration management for Sieve.
//!
//! A job file (`sieve.toml`) carries the anonymization rules, the
//! transformation pipeline, runtime knobs and logging settings for the CLI.
//! Library callers can ignore it and pass rules to the engines directly.
//!
//! # Overview
//!
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SIEVE_<SECTION>_<KEY>` overrides
//! - Default values for every section
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sieve::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sieve.toml")?;
//! println!("Pipeline rules: {}", config.pipeline.rules.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [anonymization]
//! seed = "${SIEVE_SEED}"
//! privacy_level = "medium"
//!
//! [[anonymization.rules]]
//! field = "ssn"
//! method = "hash"
//! parameters = { length = 32 }
//!
//! [[pipeline.rules]]
//! id = "age-to-int"
//! type = "convert"
//! source_field = "age"
//! parameters = { to_type = "integer" }
//!
//! [runtime]
//! batch_size = 500
//! cancel_policy = "abort_now"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    AnonymizationConfig, ApplicationConfig, LoggingConfig, PipelineConfig, RuntimeConfig,
    SieveConfig,
};
