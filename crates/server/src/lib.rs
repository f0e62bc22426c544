//! Wire Extract Server
//!
//! Single-endpoint HTTP upload service: accept a wire-transfer PDF,
//! persist it under the upload directory, run the extraction pipeline and
//! return the structured fields as JSON.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<wire_extract_core::Error> for ServerError {
    fn from(err: wire_extract_core::Error) -> Self {
        match err {
            wire_extract_core::Error::Document(msg) => ServerError::Document(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<&ServerError> for axum::http::StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Document(_) => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
