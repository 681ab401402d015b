//! Transformation module for Sieve
//!
//! Proposes and runs ordered rule pipelines over tabular datasets.
//!
//! # Architecture
//!
//! - **Rules**: closed rule-type set with typed parameters ([`rules`])
//! - **Operations**: pure per-rule helpers ([`operations`])
//! - **Executor**: ordered fold with schema evolution, progress and halting ([`pipeline`])
//! - **Suggestions**: sample-based rule proposals ([`suggest`])
//! - **Reporting**: per-field counts, removals and row errors ([`report`])

pub mod operations;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod suggest;

// Re-export main types
pub use pipeline::{apply_transformations, validate_pipeline, PipelineExecutor, TransformationOutcome};
pub use report::{RuleFailure, TransformationReport};
pub use rules::{TargetType, TransformKind, TransformRule, TransformationPipeline};
pub use suggest::{analyze_for_transformations, HeuristicSuggester, Suggestions, TransformSuggester};
