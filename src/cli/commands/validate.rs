//! Validate config command implementation
//!
//! Loads a job file, runs every section's validation and prints a summary.

use super::EXIT_CONFIG;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates every section before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Seed: {}",
            if config.anonymization.seed.is_empty() {
                "not set"
            } else {
                "set"
            }
        );
        match config.anonymization.privacy_level {
            Some(level) => println!("  Privacy Level: {level}"),
            None => println!("  Privacy Level: none"),
        }
        println!(
            "  Anonymization Rules: {}",
            config.anonymization.rules.len()
        );
        println!("  Pipeline Rules: {}", config.pipeline.rules.len());
        println!("  Preserve Original: {}", config.pipeline.preserve_original);
        println!("  Batch Size: {}", config.runtime.batch_size);
        println!("  Cancel Policy: {:?}", config.runtime.cancel_policy);
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_reports_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[runtime]\nbatch_size = 0\n").unwrap();
        file.flush().unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_validate_accepts_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[application]\nlog_level = \"debug\"\n").unwrap();
        file.flush().unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("no-such-sieve.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
