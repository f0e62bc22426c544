//! Feature pipeline
//!
//! Converts raw document text into the numeric representation the
//! predictors expect. The service runs the vectorized variant: a TF-IDF
//! vectorizer fitted offline is loaded read-only and produces one feature
//! vector shared by all eight predictors.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ndarray::Array1;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use wire_extract_core::{Error, Result};

/// Feature pipeline contract
///
/// Implementations must be deterministic, pure functions of the input text
/// with no mutation of shared state.
pub trait Featurizer: Send + Sync {
    /// Width of the produced feature vector
    fn dim(&self) -> usize;

    /// Transform raw document text into the shared feature vector
    fn transform(&self, text: &str) -> Array1<f32>;
}

// Word tokens of two or more word characters, matching the tokenization the
// vectorizer was fitted with.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Serialized vectorizer artifact
#[derive(Debug, Deserialize)]
struct VectorizerData {
    /// token -> column index
    vocabulary: HashMap<String, usize>,
    /// inverse document frequency per column
    idf: Vec<f32>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
}

fn default_lowercase() -> bool {
    true
}

/// TF-IDF vectorizer fitted during training, loaded once at startup.
#[derive(Debug)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    lowercase: bool,
}

impl TfidfVectorizer {
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f32>) -> Result<Self> {
        for (token, &column) in &vocabulary {
            if column >= idf.len() {
                return Err(Error::Artifact(format!(
                    "vectorizer vocabulary entry '{}' points at column {} but only {} idf weights are present",
                    token,
                    column,
                    idf.len()
                )));
            }
        }

        Ok(Self {
            vocabulary,
            idf,
            lowercase: true,
        })
    }

    /// Load the vectorizer from its JSON artifact. Any parse or consistency
    /// failure is fatal.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;
        let data: VectorizerData = serde_json::from_str(&raw)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

        let mut vectorizer = Self::new(data.vocabulary, data.idf)?;
        vectorizer.lowercase = data.lowercase;
        Ok(vectorizer)
    }

    fn term_counts(&self, text: &str) -> HashMap<usize, f32> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in TOKEN.find_iter(&text) {
            if let Some(&column) = self.vocabulary.get(token.as_str()) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }
        counts
    }
}

impl Featurizer for TfidfVectorizer {
    fn dim(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> Array1<f32> {
        let mut features = Array1::<f32>::zeros(self.idf.len());

        for (column, count) in self.term_counts(text) {
            features[column] = count * self.idf[column];
        }

        // L2-normalize, matching the fitted transform
        let norm = features.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            features.mapv_inplace(|v| v / norm);
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_vectorizer() -> TfidfVectorizer {
        let vocabulary =
            HashMap::from([("wire".to_string(), 0), ("amount".to_string(), 1)]);
        TfidfVectorizer::new(vocabulary, vec![1.0, 2.0]).unwrap()
    }

    #[test]
    fn test_transform_weights_and_normalizes() {
        let v = small_vectorizer();
        let features = v.transform("wire wire amount");

        // tf [2, 1] * idf [1, 2] = [2, 2], L2-normalized
        let expected = 1.0 / 2.0_f32.sqrt();
        assert!((features[0] - expected).abs() < 1e-6);
        assert!((features[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let v = small_vectorizer();
        let text = "Wire Amount (USD): 1,250.50";
        assert_eq!(v.transform(text), v.transform(text));
    }

    #[test]
    fn test_unknown_and_short_tokens_ignored() {
        let v = small_vectorizer();
        // "x" is below the 2-char token floor, "transfer" is out of vocabulary
        let features = v.transform("x transfer");
        assert!(features.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_lowercase_applied() {
        let v = small_vectorizer();
        let features = v.transform("WIRE");
        assert!(features[0] > 0.0);
    }

    #[test]
    fn test_empty_text_gives_zero_vector() {
        let v = small_vectorizer();
        let features = v.transform("");
        assert_eq!(features.len(), 2);
        assert!(features.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_vocabulary_column_out_of_range_is_fatal() {
        let vocabulary = HashMap::from([("wire".to_string(), 5)]);
        let err = TfidfVectorizer::new(vocabulary, vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"vocabulary": {{"wire": 0, "fee": 1}}, "idf": [1.5, 0.5]}}"#
        )
        .unwrap();

        let v = TfidfVectorizer::from_file(file.path()).unwrap();
        assert_eq!(v.dim(), 2);
        assert!(v.lowercase);
        assert!(v.transform("wire fee")[0] > 0.0);
    }

    #[test]
    fn test_from_file_corrupt_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = TfidfVectorizer::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }
}
