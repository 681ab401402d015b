//! Transform command implementation
//!
//! Runs the `[pipeline]` section of the job file over a dataset.

use super::{
    finish_printer, progress_reporter, read_records, read_schema, write_json, EXIT_CONFIG,
    EXIT_FATAL, EXIT_HALTED, EXIT_INTERRUPTED,
};
use crate::config::load_config;
use crate::domain::SieveError;
use crate::transform::{apply_transformations, TransformationPipeline};
use clap::Args;
use serde_json::json;
use tokio::sync::watch;

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Dataset to transform (JSON array of objects)
    #[arg(short, long)]
    pub input: String,

    /// Optional schema file (JSON array of fields)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Write transformed data, schema and report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl TransformArgs {
    /// Execute the transform command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Starting transform command");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if config.pipeline.rules.is_empty() {
            eprintln!("❌ No [[pipeline.rules]] in {config_path}");
            return Ok(EXIT_CONFIG);
        }

        let data = read_records(&self.input)?;
        let schema = read_schema(self.schema.as_deref())?;
        let pipeline = TransformationPipeline::new(config.pipeline.rules.clone())
            .with_preserve_original(config.pipeline.preserve_original);

        let (progress, printer) = progress_reporter(&config, shutdown_signal);
        let result = apply_transformations(&data, &schema, &pipeline, progress).await;
        finish_printer(printer).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(SieveError::Cancelled { processed }) => {
                eprintln!("⚠️  Transformation cancelled after {processed} steps; nothing written");
                return Ok(EXIT_INTERRUPTED);
            }
            Err(e) if e.is_validation() => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Transformation failed");
                eprintln!("❌ Transformation failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        eprintln!("{}", outcome.report.format_console());
        write_json(
            self.output.as_deref(),
            &json!({
                "transformed_data": outcome.transformed_data,
                "schema": outcome.schema,
                "report": outcome.report,
            }),
        )?;

        Ok(if outcome.report.is_complete() {
            0
        } else {
            EXIT_HALTED
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_transform_halt_exit_code() {
        let config = temp_file(
            r#"
[[pipeline.rules]]
id = "calc"
type = "calculate"
source_field = "a"
parameters = { operation = "sum", operands = ["b"] }
"#,
        );
        let input = temp_file(r#"[{"a": 1, "b": 2}]"#);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");

        let args = TransformArgs {
            input: input.path().to_str().unwrap().to_string(),
            schema: None,
            output: Some(output.to_str().unwrap().to_string()),
        };
        let (_tx, rx) = watch::channel(false);
        let code = args
            .execute(config.path().to_str().unwrap(), rx)
            .await
            .unwrap();

        assert_eq!(code, EXIT_HALTED);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["report"]["halted"]["rule_id"], "calc");
    }
}
