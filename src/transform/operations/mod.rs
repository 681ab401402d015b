//! Pure per-rule operations used by the pipeline executor
//!
//! Each module works on borrowed records and returns new values; none of
//! them know about progress, reports or the rule order.

pub mod aggregate;
pub mod calculate;
pub mod convert;
pub mod filter;
pub mod format;
pub mod rename;

pub use aggregate::AggregatePlan;
pub use filter::Predicate;
