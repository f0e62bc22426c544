//! Extraction orchestrator
//!
//! Sequences text extraction, the feature pipeline, the eight per-field
//! predictions, categorical decoding and the heuristic overlay into one
//! structured result per document. Holds only read-only state after
//! construction, so a single extractor serves concurrent requests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;

use wire_extract_config::ModelConfig;
use wire_extract_core::{truncate_raw_text, Error, ExtractionResult, FieldName, Result};

use crate::features::{Featurizer, TfidfVectorizer};
use crate::heuristics::{self, HeuristicFields};
use crate::labels::LabelEncoder;
use crate::models::{ModelStore, PredictorStore};
use crate::text::extract_document_text;

/// Artifact manifest (`metadata.json` in the artifact directory)
///
/// Names the vectorizer file and the encoder file for each categorical
/// field. A missing manifest or a missing entry is a fatal startup
/// condition.
#[derive(Debug, Deserialize)]
pub struct ArtifactManifest {
    pub vectorizer: String,
    pub label_encoders: HashMap<String, String>,
}

impl ArtifactManifest {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("metadata.json");
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))
    }
}

/// Extraction orchestrator
pub struct FieldExtractor {
    featurizer: Box<dyn Featurizer>,
    store: Box<dyn PredictorStore>,
    encoders: HashMap<FieldName, LabelEncoder>,
}

impl FieldExtractor {
    /// Load every artifact from the configured directory.
    ///
    /// Any missing or corrupt model, encoder, vectorizer or manifest file
    /// fails construction; the caller must abort startup rather than serve
    /// requests in that state.
    pub fn from_artifact_dir(config: &ModelConfig) -> Result<Self> {
        let dir = Path::new(&config.artifact_dir);
        let manifest = ArtifactManifest::load(dir)?;

        let vectorizer = TfidfVectorizer::from_file(dir.join(&manifest.vectorizer))?;

        let mut encoders = HashMap::new();
        for field in FieldName::CATEGORICAL {
            let file = manifest.label_encoders.get(field.key()).ok_or_else(|| {
                Error::Artifact(format!("manifest names no label encoder for {}", field))
            })?;
            encoders.insert(field, LabelEncoder::from_file(dir.join(file))?);
        }

        let store = ModelStore::load(dir, config.intra_threads)?;

        tracing::info!(
            artifact_dir = %dir.display(),
            feature_dim = vectorizer.dim(),
            "loaded extraction artifacts"
        );

        Ok(Self::new(Box::new(vectorizer), Box::new(store), encoders))
    }

    pub fn new(
        featurizer: Box<dyn Featurizer>,
        store: Box<dyn PredictorStore>,
        encoders: HashMap<FieldName, LabelEncoder>,
    ) -> Self {
        Self {
            featurizer,
            store,
            encoders,
        }
    }

    /// Extract structured fields from a document on disk.
    pub fn extract(&self, path: impl AsRef<Path>) -> Result<ExtractionResult> {
        let text = extract_document_text(path)?;
        self.extract_from_text(&text)
    }

    /// Extract structured fields from already-extracted document text.
    pub fn extract_from_text(&self, text: &str) -> Result<ExtractionResult> {
        let features = self.featurizer.transform(text);

        let mut result = ExtractionResult {
            amount_before: self.predict_numeric(FieldName::AmountBefore, &features)?,
            from_currency: self.predict_category(FieldName::FromCurrency, &features)?,
            to_currency: self.predict_category(FieldName::ToCurrency, &features)?,
            exchange_rate: self.predict_numeric(FieldName::ExchangeRate, &features)?,
            fee: self.predict_numeric(FieldName::Fee, &features)?,
            fee_currency: self.predict_category(FieldName::FeeCurrency, &features)?,
            amount_converted: self.predict_numeric(FieldName::AmountConverted, &features)?,
            after_fee: self.predict_numeric(FieldName::AfterFee, &features)?,
            date: None,
            raw_text: truncate_raw_text(text),
        };

        // Explicit labeled values found verbatim in the document are trusted
        // over the statistical prediction whenever both are available.
        apply_overrides(&mut result, heuristics::scan(text));

        Ok(result)
    }

    fn predict_numeric(&self, field: FieldName, features: &Array1<f32>) -> Result<f64> {
        Ok(f64::from(self.store.predict(field, features)?))
    }

    fn predict_category(&self, field: FieldName, features: &Array1<f32>) -> Result<String> {
        let raw = self.store.predict(field, features)?;
        let encoder = self
            .encoders
            .get(&field)
            .ok_or_else(|| Error::Model(format!("no label encoder for {}", field)))?;
        Ok(encoder.decode(raw))
    }
}

/// Overlay the non-null heuristic fields onto the model predictions.
///
/// `after_fee` has no heuristic and keeps its model prediction; `date` is
/// heuristic-only, the models never predict it.
fn apply_overrides(result: &mut ExtractionResult, found: HeuristicFields) {
    if let Some(amount) = found.amount_before {
        result.amount_before = amount;
    }
    if let Some(currency) = found.from_currency {
        result.from_currency = currency;
    }
    if let Some(amount) = found.amount_converted {
        result.amount_converted = amount;
    }
    if let Some(currency) = found.to_currency {
        result.to_currency = currency;
    }
    if let Some(rate) = found.exchange_rate {
        result.exchange_rate = rate;
    }
    if let Some(fee) = found.fee {
        result.fee = fee;
    }
    if let Some(currency) = found.fee_currency {
        result.fee_currency = currency;
    }
    result.date = found.date.map(|d| d.format("%Y-%m-%d").to_string());
}
