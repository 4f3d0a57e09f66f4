//! Fitted dictionary vectorizer

use crate::feature_extractor::{FeatureValue, RideFeatures};
use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

fn default_separator() -> String {
    "=".to_string()
}

/// On-disk form of a fitted vectorizer
#[derive(Debug, Clone, Deserialize)]
pub struct VectorizerSpec {
    /// Output column names, in column order
    pub feature_names: Vec<String>,
    /// Separator between a categorical feature name and its value
    #[serde(default = "default_separator")]
    pub separator: String,
}

/// Turns named features into the fixed-width vector the model was fitted on.
///
/// Categorical features become one-hot columns named `<name><sep><value>`,
/// numeric features keep their own name. Columns unknown to the fitted
/// vocabulary are dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "VectorizerSpec")]
pub struct DictVectorizer {
    feature_names: Vec<String>,
    separator: String,
    vocabulary: HashMap<String, usize>,
}

impl DictVectorizer {
    pub fn new(feature_names: Vec<String>, separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if feature_names.is_empty() {
            bail!("Vectorizer has no feature names");
        }

        let mut vocabulary = HashMap::with_capacity(feature_names.len());
        for (index, name) in feature_names.iter().enumerate() {
            if vocabulary.insert(name.clone(), index).is_some() {
                bail!("Duplicate vectorizer feature name: {}", name);
            }
        }

        Ok(Self {
            feature_names,
            separator,
            vocabulary,
        })
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Column index for a feature name, if it was seen during fitting
    pub fn column(&self, name: &str) -> Option<usize> {
        self.vocabulary.get(name).copied()
    }

    /// Dense vector for one set of features.
    pub fn transform(&self, features: &RideFeatures) -> Vec<f64> {
        let mut row = vec![0.0; self.width()];

        for (name, value) in features.iter() {
            let (column, value) = match value {
                FeatureValue::Categorical(category) => {
                    (format!("{}{}{}", name, self.separator, category), 1.0)
                }
                FeatureValue::Numeric(number) => (name.to_string(), *number),
            };

            match self.vocabulary.get(&column) {
                Some(&index) => row[index] += value,
                None => debug!(column = %column, "Feature not in vocabulary, ignored"),
            }
        }

        row
    }
}

impl TryFrom<VectorizerSpec> for DictVectorizer {
    type Error = anyhow::Error;

    fn try_from(spec: VectorizerSpec) -> Result<Self> {
        Self::new(spec.feature_names, spec.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::prepare_features;
    use crate::types::Ride;

    fn vectorizer() -> DictVectorizer {
        DictVectorizer::new(
            vec![
                "PU_DO=10_20".to_string(),
                "PU_DO=43_151".to_string(),
                "trip_distance".to_string(),
            ],
            "=",
        )
        .unwrap()
    }

    #[test]
    fn test_one_hot_and_passthrough() {
        let row = vectorizer().transform(&prepare_features(&Ride::new(10, 20, 5.0)));
        assert_eq!(row, vec![1.0, 0.0, 5.0]);
    }

    #[test]
    fn test_unseen_category_is_dropped() {
        let row = vectorizer().transform(&prepare_features(&Ride::new(1, 2, 3.5)));
        assert_eq!(row, vec![0.0, 0.0, 3.5]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = DictVectorizer::new(vec!["a".to_string(), "a".to_string()], "=");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        assert!(DictVectorizer::new(Vec::new(), "=").is_err());
    }

    #[test]
    fn test_deserialize_with_default_separator() {
        let vectorizer: DictVectorizer =
            serde_json::from_str(r#"{"feature_names": ["PU_DO=1_2", "trip_distance"]}"#).unwrap();

        assert_eq!(vectorizer.separator(), "=");
        assert_eq!(vectorizer.width(), 2);
        assert_eq!(vectorizer.column("trip_distance"), Some(1));
    }

    #[test]
    fn test_custom_separator() {
        let vectorizer =
            DictVectorizer::new(vec!["PU_DO:10_20".to_string(), "trip_distance".to_string()], ":")
                .unwrap();
        let row = vectorizer.transform(&prepare_features(&Ride::new(10, 20, 2.0)));
        assert_eq!(row, vec![1.0, 2.0]);
    }
}
