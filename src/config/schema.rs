//! Configuration schema types
//!
//! This module defines the structure of a Sieve job file (`sieve.toml`).

use crate::anonymization::presets::Level;
use crate::anonymization::rules::{AnonymizationRule, RuleSet};
use crate::protocol::{CancelPolicy, DEFAULT_BATCH_SIZE};
use crate::transform::rules::TransformRule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Main Sieve configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SieveConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Anonymization job
    #[serde(default)]
    pub anonymization: AnonymizationConfig,

    /// Transformation job
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Engine runtime settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SieveConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.anonymization.validate()?;
        self.pipeline.validate()?;
        self.runtime.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name, used in log output
    #[serde(default = "default_name")]
    pub name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Anonymization job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Seed for hash, fake and shuffle
    #[serde(default)]
    pub seed: String,

    /// Keep masked values the same length as the originals
    #[serde(default = "default_true")]
    pub preserve_format: bool,

    /// Preset applied on top of explicit rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_level: Option<Level>,

    /// Explicit rules; these win over preset rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<AnonymizationRule>,
}

impl AnonymizationConfig {
    /// Whether the file asks for any anonymization
    pub fn is_configured(&self) -> bool {
        !self.rules.is_empty() || self.privacy_level.is_some()
    }

    fn validate(&self) -> Result<(), String> {
        if self.is_configured() && self.seed.trim().is_empty() {
            return Err(
                "anonymization.seed must be set when rules or a privacy_level are configured"
                    .to_string(),
            );
        }
        RuleSet::compile(&self.rules).map_err(|e| format!("anonymization.rules: {e}"))?;
        Ok(())
    }
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            preserve_format: true,
            privacy_level: None,
            rules: Vec::new(),
        }
    }
}

/// Transformation job configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Keep the source key when renaming
    #[serde(default)]
    pub preserve_original: bool,

    /// Rules in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<TransformRule>,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(format!("Duplicate pipeline rule id '{}'", rule.id));
            }
        }
        Ok(())
    }
}

/// Engine runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Rows between progress checkpoints
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Capacity of the progress channel
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,

    /// What a run does on ctrl-c
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
}

impl RuntimeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("runtime.batch_size must be > 0".to_string());
        }
        if self.progress_buffer == 0 {
            return Err("runtime.progress_buffer must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_buffer: default_progress_buffer(),
            cancel_policy: CancelPolicy::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path must be set when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_name() -> String {
    "sieve".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_progress_buffer() -> usize {
    64
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
