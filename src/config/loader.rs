//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SieveConfig;
use crate::domain::errors::SieveError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SieveConfig
/// 4. Applies environment variable overrides (SIEVE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use sieve::config::loader::load_config;
///
/// let config = load_config("sieve.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SieveConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SieveError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SieveError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parse configuration from TOML text, with substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<SieveConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SieveConfig = toml::from_str(&contents)
        .map_err(|e| SieveError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SieveError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left alone. Every missing variable is reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in ENV_PLACEHOLDER.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SieveError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SieveError::Configuration(format!("Invalid value for {name}: '{value}'"))
    })
}

/// Applies environment variable overrides using the SIEVE_* prefix
///
/// Variables follow the pattern SIEVE_<SECTION>_<KEY>, for example
/// SIEVE_ANONYMIZATION_SEED or SIEVE_RUNTIME_BATCH_SIZE.
fn apply_env_overrides(config: &mut SieveConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("SIEVE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Anonymization overrides
    if let Ok(val) = std::env::var("SIEVE_ANONYMIZATION_SEED") {
        config.anonymization.seed = val;
    }
    if let Ok(val) = std::env::var("SIEVE_ANONYMIZATION_PRESERVE_FORMAT") {
        config.anonymization.preserve_format =
            parse_override("SIEVE_ANONYMIZATION_PRESERVE_FORMAT", &val)?;
    }
    if let Ok(val) = std::env::var("SIEVE_ANONYMIZATION_PRIVACY_LEVEL") {
        config.anonymization.privacy_level =
            Some(val.parse().map_err(SieveError::Configuration)?);
    }

    // Runtime overrides
    if let Ok(val) = std::env::var("SIEVE_RUNTIME_BATCH_SIZE") {
        config.runtime.batch_size = parse_override("SIEVE_RUNTIME_BATCH_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("SIEVE_RUNTIME_CANCEL_POLICY") {
        config.runtime.cancel_policy = val.parse()?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SIEVE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("SIEVE_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("SIEVE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
