//! Label decoding
//!
//! One encoder per categorical field maps the classifier's integer class
//! index back to its category string. Classifier outputs arrive as floats
//! through the regression-style prediction interface and must be coerced
//! before lookup.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use wire_extract_core::{Error, Result};

/// Serialized encoder artifact
#[derive(Debug, Deserialize)]
struct EncoderData {
    /// category string per class index
    classes: Vec<String>,
}

/// Fitted label encoder, loaded once and read-only thereafter.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Load the encoder from its JSON artifact. A missing or corrupt file
    /// is fatal.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;
        let data: EncoderData = serde_json::from_str(&raw)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

        if data.classes.is_empty() {
            return Err(Error::Artifact(format!(
                "{}: encoder has no classes",
                path.display()
            )));
        }

        Ok(Self::new(data.classes))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Decode a raw prediction into its category string.
    ///
    /// The value is rounded half-away-from-zero (`f32::round`) to the
    /// nearest class index; 2.5 therefore decodes as index 3. An index with
    /// no fitted category, including anything negative, decodes to an empty
    /// string rather than failing.
    pub fn decode(&self, raw: f32) -> String {
        let index = raw.round();
        if index < 0.0 {
            return String::new();
        }

        self.classes
            .get(index as usize)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn currency_encoder() -> LabelEncoder {
        LabelEncoder::new(vec![
            "USD".to_string(),
            "EUR".to_string(),
            "GBP".to_string(),
        ])
    }

    #[test]
    fn test_decode_rounds_to_nearest() {
        let encoder = currency_encoder();
        assert_eq!(encoder.decode(0.0), "USD");
        assert_eq!(encoder.decode(1.2), "EUR");
        assert_eq!(encoder.decode(1.9), "GBP");
    }

    #[test]
    fn test_decode_unknown_index_is_empty() {
        let encoder = currency_encoder();
        // 2.6 rounds to 3, which has no fitted category
        assert_eq!(encoder.decode(2.6), "");
        assert_eq!(encoder.decode(17.0), "");
    }

    #[test]
    fn test_decode_half_rounds_away_from_zero() {
        let encoder = currency_encoder();
        assert_eq!(encoder.decode(1.5), "GBP");
        // 2.5 rounds up to 3 -> out of range
        assert_eq!(encoder.decode(2.5), "");
    }

    #[test]
    fn test_decode_negative_is_empty() {
        let encoder = currency_encoder();
        assert_eq!(encoder.decode(-0.4), "USD");
        assert_eq!(encoder.decode(-0.6), "");
        assert_eq!(encoder.decode(-3.0), "");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes": ["USD", "EUR"]}}"#).unwrap();

        let encoder = LabelEncoder::from_file(file.path()).unwrap();
        assert_eq!(encoder.len(), 2);
        assert_eq!(encoder.decode(1.0), "EUR");
    }

    #[test]
    fn test_from_file_empty_classes_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes": []}}"#).unwrap();

        let err = LabelEncoder::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }
}
