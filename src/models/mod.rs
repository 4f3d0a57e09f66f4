//! Model artifacts and inference components

pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod regressor;
pub mod vectorizer;

pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use regressor::{LinearRegression, Regressor};
pub use vectorizer::DictVectorizer;
