//! ONNX Runtime regressor

use crate::models::regressor::Regressor;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Regression model exported to ONNX, e.g. via skl2onnx
pub struct OnnxRegressor {
    /// Running a session needs `&mut`
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    /// Load a model from file, running with `threads` intra-op threads
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx names the regressor output `variable`
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "variable")
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(
            input = %input_name,
            output = %output_name,
            "ONNX model loaded successfully"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Regressor for OnnxRegressor {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let row: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .context(format!("Model produced no `{}` output", self.output_name))?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .context("Model output is not a float tensor")?;

        let value = data
            .first()
            .copied()
            .context("Model returned an empty prediction")?;

        debug!(prediction = value, "ONNX inference complete");
        Ok(value as f64)
    }
}
