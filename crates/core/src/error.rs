//! Error taxonomy
//!
//! Three categories surface as errors:
//! - `Artifact`: a model, encoder, vectorizer or manifest file is missing or
//!   corrupt. Raised during startup only; the process must not serve
//!   requests in this state.
//! - `Document`: the uploaded file cannot be opened or is not a valid PDF.
//!   Fatal for that request, no retry, no partial result.
//! - `Model`: inference itself failed. Fatal for that request.
//!
//! Soft failures (unparseable numbers or dates, missing regex matches,
//! unknown label indices) are never represented here. They are recovered
//! where they occur by omitting or defaulting the affected field.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Extraction service errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or corrupt model/encoder/vectorizer artifact
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Unreadable or invalid input document
    #[error("document error: {0}")]
    Document(String),

    /// Model inference failure
    #[error("model error: {0}")]
    Model(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that must abort startup rather than fail a request.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, Error::Artifact(_))
    }
}
