//! Integration tests for job file loading and validation
//!
//! Tests that touch SIEVE_* variables hold ENV_MUTEX so they do not see each
//! other's overrides.

use sieve::anonymization::Level;
use sieve::config::{load_config, parse_config};
use sieve::domain::SieveError;
use sieve::protocol::CancelPolicy;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDES: [&str; 6] = [
    "SIEVE_APPLICATION_LOG_LEVEL",
    "SIEVE_ANONYMIZATION_SEED",
    "SIEVE_ANONYMIZATION_PRIVACY_LEVEL",
    "SIEVE_RUNTIME_BATCH_SIZE",
    "SIEVE_RUNTIME_CANCEL_POLICY",
    "SIEVE_LOGGING_LOCAL_ENABLED",
];

fn cleanup_env_vars() {
    for name in OVERRIDES {
        std::env::remove_var(name);
    }
    std::env::remove_var("TEST_SIEVE_SEED");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const JOB: &str = r#"
[application]
name = "nightly-export"
log_level = "info"

[anonymization]
seed = "${TEST_SIEVE_SEED}"
# a commented ${NOT_SET_ANYWHERE} placeholder is ignored

[[anonymization.rules]]
field = "email"
method = "mask"
parameters = { partial = true }

[[anonymization.rules]]
field = "*"
method = "hash"

[[pipeline.rules]]
id = "r1"
type = "convert"
source_field = "age"
parameters = { to_type = "integer" }

[[pipeline.rules]]
id = "r2"
type = "aggregate"
source_field = "region"
parameters = { group_by = "region", include_count = true }
"#;

#[test]
fn test_load_job_with_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_SIEVE_SEED", "from-env");

    let file = write_config(JOB);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.name, "nightly-export");
    assert_eq!(config.anonymization.seed, "from-env");
    assert_eq!(config.anonymization.rules.len(), 2);
    assert_eq!(config.anonymization.rules[1].field_name(), None);
    assert_eq!(config.pipeline.rules.len(), 2);
    assert_eq!(config.runtime.cancel_policy, CancelPolicy::AbortNow);

    cleanup_env_vars();
}

#[test]
fn test_missing_placeholder_variable() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let err = parse_config(JOB).unwrap_err();
    assert!(matches!(err, SieveError::Configuration(_)));
    assert!(err.to_string().contains("TEST_SIEVE_SEED"));
    assert!(!err.to_string().contains("NOT_SET_ANYWHERE"));
}

#[test]
fn test_env_overrides_apply_after_parsing() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SIEVE_APPLICATION_LOG_LEVEL", "debug");
    std::env::set_var("SIEVE_ANONYMIZATION_SEED", "override-seed");
    std::env::set_var("SIEVE_ANONYMIZATION_PRIVACY_LEVEL", "high");
    std::env::set_var("SIEVE_RUNTIME_BATCH_SIZE", "64");
    std::env::set_var("SIEVE_RUNTIME_CANCEL_POLICY", "drain");

    let config = parse_config("[anonymization]\nseed = \"from-file\"\n").unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.anonymization.seed, "override-seed");
    assert_eq!(config.anonymization.privacy_level, Some(Level::High));
    assert_eq!(config.runtime.batch_size, 64);
    assert_eq!(config.runtime.cancel_policy, CancelPolicy::DrainToCompletion);

    cleanup_env_vars();
}

#[test]
fn test_invalid_overrides_are_configuration_errors() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    std::env::set_var("SIEVE_RUNTIME_BATCH_SIZE", "lots");
    let err = parse_config("").unwrap_err();
    assert!(err.to_string().contains("SIEVE_RUNTIME_BATCH_SIZE"));
    cleanup_env_vars();

    std::env::set_var("SIEVE_ANONYMIZATION_PRIVACY_LEVEL", "extreme");
    assert!(matches!(
        parse_config("").unwrap_err(),
        SieveError::Configuration(_)
    ));
    cleanup_env_vars();

    // an override can also make an otherwise valid file fail validation
    std::env::set_var("SIEVE_APPLICATION_LOG_LEVEL", "loud");
    let err = parse_config("").unwrap_err();
    assert!(err.to_string().contains("log_level"));
    cleanup_env_vars();
}

#[test]
fn test_structural_rule_errors_rejected_at_load() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let duplicate_fields = r#"
[anonymization]
seed = "s"

[[anonymization.rules]]
field = "email"
method = "remove"

[[anonymization.rules]]
field = "email"
method = "shuffle"
"#;
    assert!(parse_config(duplicate_fields).is_err());

    let duplicate_ids = r#"
[[pipeline.rules]]
id = "same"
type = "rename"
source_field = "a"
target_field = "b"

[[pipeline.rules]]
id = "same"
type = "rename"
source_field = "b"
target_field = "c"
"#;
    assert!(parse_config(duplicate_ids).is_err());

    let unknown_method = r#"
[anonymization]
seed = "s"

[[anonymization.rules]]
field = "email"
method = "encrypt"
"#;
    assert!(parse_config(unknown_method).is_err());

    let seedless = r#"
[[anonymization.rules]]
field = "email"
method = "hash"
"#;
    let err = parse_config(seedless).unwrap_err();
    assert!(err.to_string().contains("seed"));
}

#[test]
fn test_empty_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let config = parse_config("").unwrap();
    assert_eq!(config.application.name, "sieve");
    assert_eq!(config.application.log_level, "info");
    assert!(config.anonymization.seed.is_empty());
    assert!(config.anonymization.preserve_format);
    assert_eq!(config.runtime.batch_size, 500);
    assert!(!config.logging.local_enabled);
}
