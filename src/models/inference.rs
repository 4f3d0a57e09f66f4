//! Inference engine for trip duration prediction

use crate::config::AppConfig;
use crate::feature_extractor::RideFeatures;
use crate::models::loader::{check_compatible, LoadedArtifact, ModelLoader};
use crate::models::regressor::Regressor;
use crate::models::vectorizer::DictVectorizer;
use anyhow::{bail, Result};
use tracing::{debug, info};

/// Fitted vectorizer and regression model, shared read-only by all requests
pub struct InferenceEngine {
    vectorizer: DictVectorizer,
    model: Box<dyn Regressor>,
}

impl InferenceEngine {
    /// Create a new inference engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads);
        let artifact = loader.load_artifact(&config.model.artifact_path)?;
        let engine = Self::from_artifact(artifact)?;

        info!(
            model = engine.model_kind(),
            features = engine.feature_width(),
            "Inference engine initialized"
        );

        Ok(engine)
    }

    /// Create an inference engine from an already loaded artifact
    pub fn from_artifact(artifact: LoadedArtifact) -> Result<Self> {
        Self::from_parts(artifact.vectorizer, artifact.model)
    }

    pub fn from_parts(vectorizer: DictVectorizer, model: Box<dyn Regressor>) -> Result<Self> {
        check_compatible(&vectorizer, model.as_ref())?;
        Ok(Self { vectorizer, model })
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    /// Width of the vector fed to the model
    pub fn feature_width(&self) -> usize {
        self.vectorizer.width()
    }

    /// Vectorize the features and run the model on them
    pub fn predict(&self, features: &RideFeatures) -> Result<f64> {
        let row = self.vectorizer.transform(features);
        let prediction = self.model.predict(&row)?;

        if !prediction.is_finite() {
            bail!("Model produced a non-finite prediction: {}", prediction);
        }

        debug!(
            model = self.model.kind(),
            active_columns = row.iter().filter(|&&x| x != 0.0).count(),
            prediction = prediction,
            "Inference complete"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::prepare_features;
    use crate::models::regressor::LinearRegression;
    use crate::types::Ride;

    fn engine() -> InferenceEngine {
        let vectorizer = DictVectorizer::new(
            vec![
                "PU_DO=10_20".to_string(),
                "PU_DO=43_151".to_string(),
                "trip_distance".to_string(),
            ],
            "=",
        )
        .unwrap();
        let model = LinearRegression::new(vec![4.0, -2.0, 3.0], 1.5).unwrap();
        InferenceEngine::from_parts(vectorizer, Box::new(model)).unwrap()
    }

    #[test]
    fn test_known_route() {
        let prediction = engine()
            .predict(&prepare_features(&Ride::new(10, 20, 5.0)))
            .unwrap();
        assert_eq!(prediction, 1.5 + 4.0 + 15.0);
    }

    #[test]
    fn test_unseen_route_uses_distance_only() {
        let prediction = engine()
            .predict(&prepare_features(&Ride::new(99, 100, 2.0)))
            .unwrap();
        assert_eq!(prediction, 1.5 + 6.0);
    }

    #[test]
    fn test_incompatible_parts_rejected() {
        let vectorizer = DictVectorizer::new(vec!["trip_distance".to_string()], "=").unwrap();
        let model = LinearRegression::new(vec![1.0, 2.0], 0.0).unwrap();
        assert!(InferenceEngine::from_parts(vectorizer, Box::new(model)).is_err());
    }

    #[test]
    fn test_engine_metadata() {
        let engine = engine();
        assert_eq!(engine.model_kind(), "linear");
        assert_eq!(engine.feature_width(), 3);
    }
}
