//! Feature preparation for trip duration inference.
//!
//! Builds the same two features the regression model was trained on:
//! a combined pickup/drop-off zone key and the raw trip distance.

use crate::types::ride::Ride;
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the combined pickup/drop-off feature
pub const PU_DO: &str = "PU_DO";

/// Name of the trip distance feature
pub const TRIP_DISTANCE: &str = "trip_distance";

/// Value of a single named feature before vectorization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// One-hot encoded by the vectorizer
    Categorical(String),
    /// Passed through by the vectorizer
    Numeric(f64),
}

/// Named features for one ride, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RideFeatures(BTreeMap<String, FeatureValue>);

impl RideFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the model features for a ride.
///
/// Pure: the same ride always yields the same features.
pub fn prepare_features(ride: &Ride) -> RideFeatures {
    let mut features = RideFeatures::new();
    features.insert(
        PU_DO,
        FeatureValue::Categorical(format!("{}_{}", ride.pu_location_id, ride.do_location_id)),
    );
    features.insert(TRIP_DISTANCE, FeatureValue::Numeric(ride.trip_distance));
    features
}

/// Feature extractor that transforms rides into model input features.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a ride.
    pub fn extract(&self, ride: &Ride) -> RideFeatures {
        prepare_features(ride)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        2
    }

    /// Get feature names, in the order they are produced.
    pub fn feature_names(&self) -> Vec<&'static str> {
        vec![PU_DO, TRIP_DISTANCE]
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_extraction() {
        let extractor = FeatureExtractor::new();
        let ride = Ride::new(10, 20, 5.0);

        let features = extractor.extract(&ride);

        assert_eq!(features.len(), extractor.feature_count());
        assert_eq!(
            features.get(PU_DO),
            Some(&FeatureValue::Categorical("10_20".to_string()))
        );
        assert_eq!(features.get(TRIP_DISTANCE), Some(&FeatureValue::Numeric(5.0)));
    }

    #[test]
    fn test_features_serialize_as_flat_mapping() {
        let features = prepare_features(&Ride::new(10, 20, 5.0));

        assert_eq!(
            serde_json::to_value(&features).unwrap(),
            json!({"PU_DO": "10_20", "trip_distance": 5.0})
        );
    }

    #[test]
    fn test_preparation_is_deterministic() {
        let ride = Ride::new("132", "7", 17.3);
        assert_eq!(prepare_features(&ride), prepare_features(&ride.clone()));
    }

    #[test]
    fn test_distance_carried_unchanged() {
        let features = prepare_features(&Ride::new(1, 1, 0.123456789));
        assert_eq!(
            features.get(TRIP_DISTANCE),
            Some(&FeatureValue::Numeric(0.123456789))
        );
    }

    #[test]
    fn test_feature_names() {
        let extractor = FeatureExtractor::new();
        let names = extractor.feature_names();
        assert_eq!(names.len(), extractor.feature_count());

        let features = extractor.extract(&Ride::new(3, 4, 1.0));
        let produced: Vec<&str> = features.iter().map(|(name, _)| name).collect();
        assert_eq!(produced, names);
    }
}
