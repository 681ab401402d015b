//! Anonymize command implementation
//!
//! Rules come from the job file; a privacy level (from `--level` or the file)
//! adds preset rules for every detected field the file does not cover.

use super::{
    finish_printer, load_config_or_default, progress_reporter, read_records, write_json,
    EXIT_CONFIG, EXIT_FATAL, EXIT_INTERRUPTED,
};
use crate::anonymization::{anonymize, detect_pii, AnonymizeOptions, Level, PrivacyLevel};
use crate::domain::{infer_schema, SieveError};
use clap::Args;
use serde_json::json;
use tokio::sync::watch;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Dataset to anonymize (JSON array of objects)
    #[arg(short, long)]
    pub input: String,

    /// Seed for deterministic methods (overrides the job file)
    #[arg(long, env = "SIEVE_SEED", hide_env_values = true)]
    pub seed: Option<String>,

    /// Privacy preset: low, medium or high (overrides the job file)
    #[arg(long)]
    pub level: Option<Level>,

    /// Write anonymized data and report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Starting anonymize command");

        let mut config = match load_config_or_default(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ {e:#}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(seed) = &self.seed {
            config.anonymization.seed = seed.clone();
        }
        if let Some(level) = self.level {
            tracing::info!(level = %level, "Overriding privacy level from CLI");
            config.anonymization.privacy_level = Some(level);
        }
        if config.anonymization.seed.trim().is_empty() {
            eprintln!("❌ A seed is required: pass --seed or set anonymization.seed");
            return Ok(EXIT_CONFIG);
        }

        let data = read_records(&self.input)?;

        let rules = match config.anonymization.privacy_level {
            Some(level) => {
                let detection = detect_pii(&data, &infer_schema(&data));
                let preset = PrivacyLevel::resolve(level, &detection);
                eprintln!("🔒 Privacy level {level}: {}", preset.description);
                preset.apply(&config.anonymization.rules)
            }
            None => config.anonymization.rules.clone(),
        };

        let (progress, printer) = progress_reporter(&config, shutdown_signal);
        let options = AnonymizeOptions::new(config.anonymization.seed.clone())
            .with_preserve_format(config.anonymization.preserve_format)
            .with_progress(progress);

        let result = anonymize(&data, &rules, options).await;
        finish_printer(printer).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(SieveError::Cancelled { processed }) => {
                eprintln!("⚠️  Anonymization cancelled after {processed} rows; nothing written");
                return Ok(EXIT_INTERRUPTED);
            }
            Err(e) if e.is_validation() => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Anonymization failed");
                eprintln!("❌ Anonymization failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        eprintln!("{}", outcome.report.format_console());
        write_json(
            self.output.as_deref(),
            &json!({
                "anonymized_data": outcome.anonymized_data,
                "report": outcome.report,
            }),
        )?;

        Ok(0)
    }
}
