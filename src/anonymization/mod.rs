//! Anonymization module for Sieve
//!
//! This module detects personal data in tabular datasets and replaces it
//! according to a rule set, deterministically for a given seed.
//!
//! # Architecture
//!
//! - **Detection**: field-name, schema and value-shape heuristics ([`detector`])
//! - **Rules**: closed method set with typed parameters ([`rules`])
//! - **Presets**: low/medium/high rule bundles derived from detection ([`presets`])
//! - **Anonymization**: per-value strategies and column shuffling ([`anonymizer`])
//! - **Engine**: two-phase run with progress and cancellation ([`engine`])
//! - **Reporting**: per-field counts with hashed audit samples ([`report`])
//!
//! # Usage
//!
//! ```no_run
//! use sieve::anonymization::{anonymize, detect_pii, AnonymizeOptions};
//! use sieve::anonymization::presets::{Level, PrivacyLevel};
//! use sieve::domain::infer_schema;
//! use serde_json::json;
//!
//! # async fn example() -> sieve::domain::Result<()> {
//! let data = vec![json!({"email": "alice@example.com"}).as_object().unwrap().clone()];
//!
//! let detection = detect_pii(&data, &infer_schema(&data));
//! let rules = PrivacyLevel::resolve(Level::Medium, &detection).apply(&[]);
//! let outcome = anonymize(&data, &rules, AnonymizeOptions::new("seed")).await?;
//! # Ok(())
//! # }
//! ```

pub mod anonymizer;
pub mod detector;
pub mod engine;
pub mod presets;
pub mod report;
pub mod rules;

// Re-export main types
pub use detector::{detect_pii, DetectedField, DetectionResult, PiiDetector, PiiType};
pub use engine::{anonymize, AnonymizationEngine, AnonymizationOutcome, AnonymizeOptions};
pub use presets::{Level, PrivacyLevel};
pub use report::AnonymizationReport;
pub use rules::{AnonymizationMethod, AnonymizationRule, MethodKind};
