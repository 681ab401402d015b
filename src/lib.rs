// Sieve - Privacy and transformation pipeline engine
// Copyright (c) 2025 Sieve Contributors
// Licensed under the MIT License

//! # Sieve - Privacy and Transformation Pipeline Engine
//!
//! Sieve prepares tabular datasets (lists of flat JSON objects) for sharing
//! and analysis.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Detecting** personally identifiable fields by name, schema and value shape
//! - **Anonymizing** them with seeded, reproducible methods and privacy presets
//! - **Suggesting** cleanup transformations from the data itself
//! - **Transforming** datasets through ordered rule pipelines
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`anonymization`] - PII detection, presets and the anonymization engine
//! - [`transform`] - Transformation rules, suggester and pipeline executor
//! - [`protocol`] - Progress events, cancellation and row-level errors
//! - [`domain`] - Records, schema and error types
//! - [`config`] - Job file loading and validation
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sieve::anonymization::{anonymize, detect_pii, AnonymizeOptions, Level, PrivacyLevel};
//! use sieve::transform::{apply_transformations, TargetType, TransformRule, TransformationPipeline};
//! use sieve::protocol::ProgressReporter;
//! use sieve::domain::infer_schema;
//!
//! # async fn example(data: Vec<sieve::domain::DataRecord>) -> sieve::domain::Result<()> {
//! // Anonymize every detected field at the medium preset
//! let detection = detect_pii(&data, &infer_schema(&data));
//! let rules = PrivacyLevel::resolve(Level::Medium, &detection).apply(&[]);
//! let anonymized = anonymize(&data, &rules, AnonymizeOptions::new("secret-seed")).await?;
//!
//! // Then clean up what is left
//! let pipeline = TransformationPipeline::new(vec![
//!     TransformRule::rename("r1", "qty", "quantity"),
//!     TransformRule::convert("r2", "quantity", TargetType::Integer),
//! ]);
//! let outcome = apply_transformations(
//!     &anonymized.anonymized_data,
//!     &[],
//!     &pipeline,
//!     ProgressReporter::silent(),
//! )
//! .await?;
//!
//! println!("{}", outcome.report.format_console());
//! # Ok(())
//! # }
//! ```
//!
//! ## Determinism
//!
//! Given the same seed, rules and input, anonymization output is identical
//! across runs. Hash and fake map equal inputs to equal outputs, so joins on
//! an anonymized key still line up.
//!
//! ## Error Handling
//!
//! Engines return [`domain::SieveError`]. Structural problems (unknown fields,
//! duplicate rules) fail before any row is touched; per-row problems are
//! collected in the run's report instead.

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
pub mod protocol;
pub mod transform;
