//! Gradebook transformation pipeline.
//!
//! Classifies the two header rows, validates student rows, merges
//! duplicate subgroup columns, aggregates grades per quarter and lays out
//! the report blocks that [`crate::output`] renders.

pub mod aggregate;
pub mod analyzer;
pub mod grade;
pub mod header;
pub mod layout;
pub mod merge;
pub mod rows;
pub mod types;
pub mod utility;
