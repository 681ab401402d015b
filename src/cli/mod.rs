//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Sieve using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Sieve - Privacy and transformation pipeline engine
#[derive(Parser, Debug)]
#[command(name = "sieve")]
#[command(version, about, long_about = None)]
#[command(author = "Sieve Contributors")]
pub struct Cli {
    /// Path to the job file
    #[arg(short, long, default_value = "sieve.toml", env = "SIEVE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SIEVE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a dataset for personally identifiable fields
    Detect(commands::detect::DetectArgs),

    /// Propose transformation rules for a dataset
    Suggest(commands::suggest::SuggestArgs),

    /// Anonymize a dataset with the job file's rules
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Run the job file's transformation pipeline over a dataset
    Transform(commands::transform::TransformArgs),

    /// Validate the job file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Create a sample job file
    Init(commands::init::InitArgs),
}
