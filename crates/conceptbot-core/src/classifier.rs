//! Intent classification over vectorized utterances.
//!
//! The trained model is a linear scorer (`coef · x + intercept`) followed by softmax;
//! logistic regression and multinomial naive Bayes exports both fit that form.
//! A one-row model is binary: the row scores class 1 against class 0.

use serde::Deserialize;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// Top label and the probability assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentPrediction {
    pub label: String,
    pub confidence: f32,
}

/// `vector → (label, confidence)`. Pure; safe to call from concurrent requests.
pub trait IntentClassifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> IntentPrediction;

    /// Label universe, in class-index order.
    fn labels(&self) -> &[String];
}

/// Class index → label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let encoder: LabelEncoder = crate::read_json(path)?;
        if encoder.classes.is_empty() {
            return Err(LoadError::artifact(path, "label encoder has no classes"));
        }
        Ok(encoder)
    }

    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// On-disk form of the classifier weights.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearArtifact {
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct LinearIntentClassifier {
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    encoder: LabelEncoder,
}

impl LinearIntentClassifier {
    /// Load weights and label encoder, checking them against each other and against
    /// the vectorizer's output dimension.
    pub fn load(
        model_path: impl AsRef<Path>,
        encoder_path: impl AsRef<Path>,
        dimension: usize,
    ) -> LoadResult<Self> {
        let model_path = model_path.as_ref();
        let artifact: LinearArtifact = crate::read_json(model_path)?;
        let encoder = LabelEncoder::load(encoder_path)?;
        let clf = Self::new(artifact, encoder, dimension)
            .map_err(|reason| LoadError::artifact(model_path, reason))?;
        tracing::info!(
            "[CONCEPTBOT] Intent classifier loaded: {} classes ({})",
            clf.encoder.len(),
            clf.encoder.classes.join(", ")
        );
        Ok(clf)
    }

    pub fn new(artifact: LinearArtifact, encoder: LabelEncoder, dimension: usize) -> Result<Self, String> {
        let rows = artifact.coef.len();
        if rows == 0 {
            return Err("classifier has no coefficient rows".to_string());
        }
        if artifact.intercept.len() != rows {
            return Err(format!(
                "intercept has {} entries for {} coefficient rows",
                artifact.intercept.len(),
                rows
            ));
        }
        if let Some(row) = artifact.coef.iter().position(|r| r.len() != dimension) {
            return Err(format!(
                "coefficient row {} has width {} but vectorizer dimension is {}",
                row,
                artifact.coef[row].len(),
                dimension
            ));
        }
        let expected = if rows == 1 { 2 } else { rows };
        if encoder.len() != expected {
            return Err(format!(
                "label encoder has {} classes but the model scores {}",
                encoder.len(),
                expected
            ));
        }
        Ok(Self {
            coef: artifact.coef,
            intercept: artifact.intercept,
            encoder,
        })
    }

    /// Class probabilities, in encoder order.
    pub fn predict_proba(&self, x: &[f32]) -> Vec<f32> {
        let scores: Vec<f32> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect();
        if scores.len() == 1 {
            let p1 = 1.0 / (1.0 + (-scores[0]).exp());
            vec![1.0 - p1, p1]
        } else {
            softmax(&scores)
        }
    }
}

impl IntentClassifier for LinearIntentClassifier {
    fn predict(&self, features: &[f32]) -> IntentPrediction {
        let proba = self.predict_proba(features);
        let (best, p) = argmax(&proba).unwrap_or((0, 0.0));
        IntentPrediction {
            label: self
                .encoder
                .inverse_transform(best)
                .unwrap_or_default()
                .to_string(),
            confidence: p,
        }
    }

    fn labels(&self) -> &[String] {
        &self.encoder.classes
    }
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// First index holding the maximum value.
pub(crate) fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best
}
