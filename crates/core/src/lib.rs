//! Core types for the wire-transfer field extraction service
//!
//! This crate provides the types shared across all other crates:
//! - The extraction result record returned to clients
//! - Field identifiers and their artifact-file naming
//! - The error taxonomy (fatal artifact/document errors vs. locally
//!   recovered soft failures)

pub mod error;
pub mod fields;

pub use error::{Error, Result};
pub use fields::{truncate_raw_text, ExtractionResult, FieldName, RAW_TEXT_LIMIT};
