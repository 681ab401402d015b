//! Domain models and types for Sieve.
//!
//! This module contains the dataset model shared by every engine:
//!
//! - **Records** ([`DataRecord`]) and scalar helpers ([`parse_date`], [`as_number`])
//! - **Schema** ([`SchemaField`], [`FieldType`], [`infer_schema`])
//! - **Error types** ([`SieveError`])
//! - **Result type alias** ([`Result`])
//!
//! Engines borrow records and schema immutably and always return freshly
//! built collections, so a caller can re-run a preview on the same source
//! data as often as it likes.
//!
//! # Error Handling
//!
//! All fallible engine operations return [`Result<T, SieveError>`]:
//!
//! ```rust
//! use sieve::domain::{Result, SieveError};
//!
//! fn example(fields: &[&str]) -> Result<()> {
//!     if fields.is_empty() {
//!         return Err(SieveError::Validation("empty schema".to_string()));
//!     }
//!     Ok(())
//! }
//! # assert!(example(&[]).is_err());
//! ```

pub mod errors;
pub mod record;
pub mod result;
pub mod schema;

// Re-export commonly used types for convenience
pub use errors::SieveError;
pub use record::{
    as_number, display_text, field_names, number_value, parse_bool, parse_date, parse_number,
    DataRecord, ParsedDate,
};
pub use result::Result;
pub use schema::{find_field, infer_schema, FieldConstraints, FieldType, SchemaField};
