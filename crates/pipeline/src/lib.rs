//! Field extraction pipeline
//!
//! This crate turns a wire-transfer PDF into a structured result record:
//! - Document text extraction (full text layer, page order)
//! - TF-IDF feature pipeline (fitted offline, loaded read-only)
//! - Model store: one ONNX predictor per field, loaded once at startup
//! - Label decoding for the categorical currency fields
//! - Regex heuristic rules whose matches override model predictions
//! - The orchestrator that sequences the above
//!
//! All loaded state is immutable after construction, so one extractor can
//! serve concurrent requests without synchronization.

pub mod extractor;
pub mod features;
pub mod heuristics;
pub mod labels;
pub mod models;
pub mod text;

pub use extractor::{ArtifactManifest, FieldExtractor};
pub use features::{Featurizer, TfidfVectorizer};
pub use heuristics::HeuristicFields;
pub use labels::LabelEncoder;
pub use models::{ModelStore, PredictorStore};
pub use text::extract_document_text;
