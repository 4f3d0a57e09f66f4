//! Regression models

use anyhow::{bail, Result};

/// A fitted regression model scoring one dense feature row.
pub trait Regressor: Send + Sync {
    /// Short model family name, e.g. `linear`
    fn kind(&self) -> &'static str;

    /// Expected input width, when the model knows it
    fn n_features(&self) -> Option<usize>;

    /// Predict a single value for one row
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Ordinary least squares model: `intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if coefficients.is_empty() {
            bail!("Linear model has no coefficients");
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            bail!("Linear model contains non-finite parameters");
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            bail!(
                "Feature vector has {} columns, model expects {}",
                features.len(),
                self.coefficients.len()
            );
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(coef, x)| coef * x)
            .sum();

        Ok(self.intercept + dot)
    }
}
