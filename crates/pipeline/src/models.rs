//! Model store
//!
//! Eight independently trained predictors (five regressors, three
//! classifiers exporting a regression-style single output), one ONNX
//! session per field. All sessions are loaded at process start from the
//! artifact directory; any missing or corrupt file aborts startup. After
//! load the store is read-only and safe to share across requests.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2};
use ort::session::{builder::GraphOptimizationLevel, Session};

use wire_extract_core::{Error, FieldName, Result};

/// Per-field prediction interface
///
/// Regressors return the continuous value; classifiers return their class
/// index through the same interface. The store never decodes indices.
pub trait PredictorStore: Send + Sync {
    fn predict(&self, field: FieldName, features: &Array1<f32>) -> Result<f32>;
}

/// ONNX-backed model store
#[derive(Debug)]
pub struct ModelStore {
    sessions: HashMap<FieldName, Session>,
}

impl ModelStore {
    /// Load one session per field from `<field>_model.onnx` files in the
    /// artifact directory.
    pub fn load(dir: impl AsRef<Path>, intra_threads: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let mut sessions = HashMap::new();

        for field in FieldName::ALL {
            let path = dir.join(field.model_file());
            if !path.exists() {
                return Err(Error::Artifact(format!(
                    "missing model file: {}",
                    path.display()
                )));
            }

            let session = Session::builder()
                .map_err(|e| Error::Artifact(e.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| Error::Artifact(e.to_string()))?
                .with_intra_threads(intra_threads)
                .map_err(|e| Error::Artifact(e.to_string()))?
                .commit_from_file(&path)
                .map_err(|e| {
                    Error::Artifact(format!("failed to load {}: {}", path.display(), e))
                })?;

            tracing::debug!(field = %field, path = %path.display(), "loaded model");
            sessions.insert(field, session);
        }

        Ok(Self { sessions })
    }
}

impl PredictorStore for ModelStore {
    fn predict(&self, field: FieldName, features: &Array1<f32>) -> Result<f32> {
        let session = self
            .sessions
            .get(&field)
            .ok_or_else(|| Error::Model(format!("no model loaded for {}", field)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| Error::Model(format!("{} model declares no inputs", field)))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| Error::Model(format!("{} model declares no outputs", field)))?;

        let batch = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| Error::Model(e.to_string()))?;

        let outputs = session
            .run(
                ort::inputs![input_name.as_str() => batch.view()]
                    .map_err(|e| Error::Model(e.to_string()))?,
            )
            .map_err(|e| Error::Model(format!("{} inference failed: {}", field, e)))?;

        let tensor = outputs
            .get(output_name.as_str())
            .ok_or_else(|| Error::Model(format!("{} produced no '{}' output", field, output_name)))?
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Model(e.to_string()))?;

        tensor
            .iter()
            .next()
            .copied()
            .ok_or_else(|| Error::Model(format!("{} produced an empty output", field)))
    }
}
