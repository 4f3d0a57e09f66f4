//! Model artifact loader

use crate::models::regressor::{LinearRegression, Regressor};
use crate::models::vectorizer::DictVectorizer;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialized model half of an artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSpec {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Path is relative to the artifact file
    Onnx { path: PathBuf },
}

/// On-disk `(vectorizer, model)` pair
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactFile {
    pub vectorizer: DictVectorizer,
    pub model: ModelSpec,
}

/// Vectorizer and model ready for inference
pub struct LoadedArtifact {
    pub vectorizer: DictVectorizer,
    pub model: Box<dyn Regressor>,
}

impl std::fmt::Debug for LoadedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifact")
            .field("vectorizer_width", &self.vectorizer.width())
            .field("model", &self.model.kind())
            .finish()
    }
}

/// Loader for model artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load an artifact file and check the vectorizer and model agree.
    pub fn load_artifact<P: AsRef<Path>>(&self, path: P) -> Result<LoadedArtifact> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model artifact");

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
        let artifact: ArtifactFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model artifact {}", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let model = self.build_model(artifact.model, base_dir)?;

        check_compatible(&artifact.vectorizer, model.as_ref())?;

        info!(
            model = model.kind(),
            features = artifact.vectorizer.width(),
            "Model artifact loaded successfully"
        );

        Ok(LoadedArtifact {
            vectorizer: artifact.vectorizer,
            model,
        })
    }

    fn build_model(&self, spec: ModelSpec, base_dir: &Path) -> Result<Box<dyn Regressor>> {
        match spec {
            ModelSpec::Linear {
                coefficients,
                intercept,
            } => Ok(Box::new(LinearRegression::new(coefficients, intercept)?)),
            ModelSpec::Onnx { path } => self.build_onnx(base_dir.join(path)),
        }
    }

    #[cfg(feature = "onnx")]
    fn build_onnx(&self, path: PathBuf) -> Result<Box<dyn Regressor>> {
        let model = crate::models::onnx::OnnxRegressor::load(&path, self.onnx_threads)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn build_onnx(&self, path: PathBuf) -> Result<Box<dyn Regressor>> {
        bail!(
            "Artifact references ONNX model {} but the `onnx` feature is disabled",
            path.display()
        )
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail when the vectorizer output cannot feed the model.
pub fn check_compatible(vectorizer: &DictVectorizer, model: &dyn Regressor) -> Result<()> {
    if let Some(expected) = model.n_features() {
        if expected != vectorizer.width() {
            bail!(
                "Vectorizer produces {} features but {} model expects {}",
                vectorizer.width(),
                model.kind(),
                expected
            );
        }
    }
    Ok(())
}
