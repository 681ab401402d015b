//! Suggest command implementation
//!
//! Proposes transformation rules for a dataset. The output can be pasted into
//! the `[[pipeline.rules]]` section of a job file.

use super::{read_records, read_schema, write_json};
use crate::transform::analyze_for_transformations;
use clap::Args;

/// Arguments for the suggest command
#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Dataset to analyze (JSON array of objects)
    #[arg(short, long)]
    pub input: String,

    /// Optional schema file (JSON array of fields)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Write the suggestions as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl SuggestArgs {
    /// Execute the suggest command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Analyzing dataset for transformations");

        let data = read_records(&self.input)?;
        let schema = read_schema(self.schema.as_deref())?;

        let suggestions = analyze_for_transformations(&data, &schema);
        if suggestions.is_empty() {
            eprintln!("No transformations suggested");
        } else {
            eprintln!("💡 {} transformation(s) suggested", suggestions.len());
        }

        write_json(self.output.as_deref(), &suggestions)?;
        Ok(0)
    }
}
