//! Prediction response returned to clients

use serde::{Deserialize, Serialize};

/// Predicted trip duration in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationPrediction {
    pub duration: f64,
}

impl DurationPrediction {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }
}
