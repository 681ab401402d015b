//! CLI command implementations
//!
//! Each command reads a JSON dataset (an array of flat objects), runs one
//! engine and writes JSON to `--output` or stdout. Progress goes to stderr.

pub mod anonymize;
pub mod detect;
pub mod init;
pub mod suggest;
pub mod transform;
pub mod validate;

use crate::config::{load_config, SieveConfig};
use crate::domain::{DataRecord, SchemaField};
use crate::protocol::ProgressReporter;
use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Exit code for configuration and validation errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for a pipeline that stopped at a malformed rule
pub const EXIT_HALTED: i32 = 3;
/// Exit code for fatal errors
pub const EXIT_FATAL: i32 = 5;
/// Exit code for a run aborted by ctrl-c
pub const EXIT_INTERRUPTED: i32 = 130;

/// Read a dataset: a JSON array of objects
pub fn read_records(path: &str) -> anyhow::Result<Vec<DataRecord>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read input file {path}"))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Input file {path} is not valid JSON"))?;

    let Value::Array(rows) = value else {
        bail!("Input file {path} must contain a JSON array of objects");
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(record) => Ok(record),
            _ => bail!("Row {i} of {path} is not a JSON object"),
        })
        .collect()
}

/// Read an optional schema file; absent means "infer from data"
pub fn read_schema(path: Option<&str>) -> anyhow::Result<Vec<SchemaField>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read schema file {path}"))?;
    serde_json::from_str(&contents).with_context(|| format!("Schema file {path} is invalid"))
}

/// Write pretty JSON to a file, or stdout when no path is given
pub fn write_json<T: Serialize>(output: Option<&str>, value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write {path}"))?;
            tracing::info!(path = %path, "Output written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Load the job file, falling back to defaults when it does not exist
pub fn load_config_or_default(config_path: &str) -> anyhow::Result<SieveConfig> {
    if !Path::new(config_path).exists() {
        tracing::debug!(config_path = %config_path, "No configuration file, using defaults");
        return Ok(SieveConfig::default());
    }
    load_config(config_path).with_context(|| format!("Invalid configuration {config_path}"))
}

/// Build a progress reporter wired to the shutdown signal, plus a task
/// printing its events to stderr
pub fn progress_reporter(
    config: &SieveConfig,
    shutdown_signal: watch::Receiver<bool>,
) -> (ProgressReporter, JoinHandle<()>) {
    let (reporter, mut events) = ProgressReporter::channel(config.runtime.progress_buffer);
    let reporter = reporter
        .with_batch_size(config.runtime.batch_size)
        .with_cancellation(shutdown_signal, config.runtime.cancel_policy);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            eprintln!("  {:>5.1}%  {}", event.percent, event.message);
        }
    });

    (reporter, printer)
}

/// Wait for the progress printer; a failed printer never fails the run
pub async fn finish_printer(printer: JoinHandle<()>) {
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Progress printer task failed");
    }
}
