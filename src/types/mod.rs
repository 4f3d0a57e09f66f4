//! Type definitions for the duration prediction service

pub mod prediction;
pub mod ride;

pub use prediction::DurationPrediction;
pub use ride::{InvalidRide, LocationId, Ride};
