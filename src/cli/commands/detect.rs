//! Detect command implementation
//!
//! Runs PII detection on a dataset and prints a dry-run report of what a
//! default anonymization would touch.

use super::{read_records, read_schema, write_json, EXIT_CONFIG};
use crate::anonymization::detector::{HeuristicDetector, Vocabulary};
use crate::anonymization::PiiDetector;
use crate::domain::infer_schema;
use clap::Args;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Dataset to scan (JSON array of objects)
    #[arg(short, long)]
    pub input: String,

    /// Optional schema file (JSON array of fields); inferred from the data when absent
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Replace the built-in field-name vocabulary with this TOML file
    #[arg(long)]
    pub vocabulary: Option<String>,

    /// Write the detection result as JSON to this file
    #[arg(short, long)]
    pub output: Option<String>,
}

impl DetectArgs {
    /// Execute the detect command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Starting PII detection");

        let mut detector = HeuristicDetector::new();
        if let Some(path) = &self.vocabulary {
            match Vocabulary::from_file(path) {
                Ok(vocabulary) => detector = detector.with_vocabulary(vocabulary),
                Err(e) => {
                    eprintln!("❌ {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        }

        let data = read_records(&self.input)?;
        let mut schema = read_schema(self.schema.as_deref())?;
        if schema.is_empty() {
            schema = infer_schema(&data);
        }

        let detection = detector.detect(&data, &schema);

        eprintln!("{}", detection.format_console());
        if self.output.is_some() {
            write_json(self.output.as_deref(), &detection)?;
        }

        Ok(0)
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
        file
    }

    fn read_output(path: &std::path::Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_detect_writes_result() {
        let input = temp_file(r#"[{"email": "a@example.com"}, {"email": "b@example.org"}]"#);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("detect.json");

        let args = DetectArgs {
            input: input.path().to_str().unwrap().to_string(),
            schema: None,
            vocabulary: None,
            output: Some(output.to_str().unwrap().to_string()),
        };
        assert_eq!(args.execute().await.unwrap(), 0);

        let written = read_output(&output);
        assert_eq!(written["detected_fields"][0]["field"], "email");
        assert_eq!(written["detected_fields"][0]["type"], "email");
    }

    #[tokio::test]
    async fn test_custom_vocabulary_replaces_builtin() {
        let input = temp_file(r#"[{"kundennummer": "k-1"}, {"kundennummer": "k-2"}]"#);
        let vocabulary = temp_file(
            r#"
[types.id]
exact = ["kundennummer"]
tokens = []
"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("detect.json");

        let args = DetectArgs {
            input: input.path().to_str().unwrap().to_string(),
            schema: None,
            vocabulary: Some(vocabulary.path().to_str().unwrap().to_string()),
            output: Some(output.to_str().unwrap().to_string()),
        };
        assert_eq!(args.execute().await.unwrap(), 0);

        let written = read_output(&output);
        assert_eq!(written["detected_fields"][0]["field"], "kundennummer");
        assert_eq!(written["detected_fields"][0]["type"], "id");
    }

    #[tokio::test]
    async fn test_missing_vocabulary_is_a_config_error() {
        let input = temp_file(r#"[{"email": "a@example.com"}]"#);
        let args = DetectArgs {
            input: input.path().to_str().unwrap().to_string(),
            schema: None,
            vocabulary: Some("/nonexistent/vocabulary.toml".to_string()),
            output: None,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
    }
}
