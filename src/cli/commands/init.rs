//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! job file.

use super::{EXIT_CONFIG, EXIT_FATAL};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the job file
    #[arg(short, long, default_value = "sieve.toml")]
    pub output: String,

    /// Include example rules and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing job file");

        println!("📝 Initializing Sieve job file");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Job file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let contents = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, contents) {
            Ok(()) => {
                println!("✅ Job file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Replace the seed, or set SIEVE_ANONYMIZATION_SEED");
                println!("  2. Run detection: sieve detect --input data.json");
                println!("  3. Add [[anonymization.rules]] and [[pipeline.rules]]");
                println!("  4. Validate: sieve --config {} validate-config", self.output);
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write job file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    fn generate_minimal_config() -> &'static str {
        r#"# Sieve job file

[application]
name = "sieve"
log_level = "info"

[anonymization]
# seed = "${SIEVE_SEED}"
seed = "replace-with-a-secret-seed"
preserve_format = true
privacy_level = "medium"

[pipeline]
preserve_original = false

[runtime]
batch_size = 500
cancel_policy = "abort_now"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
    }

    fn generate_config_with_examples() -> &'static str {
        r#"# Sieve job file
#
# Every section is optional. ${VAR} placeholders are replaced from the
# environment before parsing, and SIEVE_<SECTION>_<KEY> variables override
# individual values afterwards.

# ============================================================================
# Application Settings
# ============================================================================
[application]
name = "sieve"

# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Anonymization
# ============================================================================
[anonymization]
# Seed for hash, fake and shuffle. The same seed and input always produce
# the same output. Keep it secret.
# seed = "${SIEVE_SEED}"
seed = "replace-with-a-secret-seed"

# Keep masked values the same length and shape as the original
preserve_format = true

# Preset applied to detected fields without an explicit rule: low | medium | high
privacy_level = "medium"

[[anonymization.rules]]
field = "email"
method = "mask"
parameters = { partial = true }

[[anonymization.rules]]
field = "customer_id"
method = "hash"
parameters = { length = 16 }

[[anonymization.rules]]
field = "birth_date"
method = "generalize"
parameters = { strategy = "date_truncate", granularity = "year" }

[[anonymization.rules]]
field = "notes"
method = "remove"

# ============================================================================
# Transformation pipeline
# ============================================================================
[pipeline]
# Keep the old key when a rename runs
preserve_original = false

[[pipeline.rules]]
id = "rename-qty"
type = "rename"
source_field = "qty"
target_field = "quantity"

[[pipeline.rules]]
id = "convert-quantity"
type = "convert"
source_field = "quantity"
parameters = { to_type = "integer" }

[[pipeline.rules]]
id = "tidy-name"
type = "format"
source_field = "name"
parameters = { case = "title", collapse_whitespace = true }

[[pipeline.rules]]
id = "line-total"
type = "calculate"
source_field = "quantity"
target_field = "line_total"
parameters = { operation = "product", operands = ["price"] }

[[pipeline.rules]]
id = "drop-empty"
type = "filter"
source_field = "quantity"
parameters = { operator = "gt", value = 0 }

[[pipeline.rules]]
id = "by-region"
type = "aggregate"
source_field = "region"
parameters = { aggregations = [{ field = "line_total", function = "sum", alias = "revenue" }], include_count = true }

# ============================================================================
# Runtime
# ============================================================================
[runtime]
# Rows between progress checkpoints
batch_size = 500

# Progress events buffered before the engine waits on the consumer
progress_buffer = 64

# On ctrl-c: abort_now discards output, drain_to_completion finishes the run
cancel_policy = "abort_now"

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "logs"

# daily | hourly | never
local_rotation = "daily"
"#
    }
}
