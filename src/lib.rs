//! Trip Duration Prediction Service Library
//!
//! Serves a pre-trained ride duration regression model over HTTP:
//! a ride comes in, two features are derived, vectorized and scored.

pub mod config;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use feature_extractor::{prepare_features, FeatureExtractor, RideFeatures};
pub use models::inference::InferenceEngine;
pub use server::{AppState, ApiError};
pub use types::{ride::Ride, prediction::DurationPrediction};
