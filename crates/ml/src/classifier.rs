//! The classifier capability and the model families the loader understands.
//!
//! The pipeline only needs "normalized vector in, class index out", so every
//! model sits behind [`Classifier`]. Tests substitute their own impls.

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::features::DerivedFeatures;
use crate::model::RawWeights;
use crate::normalize::NormalizedFeatures;

/// A fitted classifier. Implementations must be pure: the same input always
/// yields the same index, and no state is kept between calls.
pub trait Classifier: Send + Sync {
    /// Map one normalized vector to a class index.
    fn classify(&self, features: &NormalizedFeatures) -> Result<usize, PredictError>;

    /// Number of classes this model can emit, if it knows.
    fn num_classes(&self) -> Option<usize>;

    /// Short family name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Index of the largest score; the lowest index wins ties.
///
/// Non-finite scores mean the weights are broken in a way we cannot
/// classify, so they are reported rather than silently ordered.
pub fn argmax<T>(scores: &[T]) -> Result<usize, PredictError>
where
    T: Copy + PartialOrd + Into<f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        let s: f64 = s.into();
        if !s.is_finite() {
            return Err(PredictError::unknown(format!(
                "classifier produced a non-finite score for class {i}"
            )));
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| PredictError::integrity("classifier has no classes"))
}

/// Multinomial linear model: `score_k = coef_k · x + intercept_k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearClassifier {
    pub fn new(coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self, PredictError> {
        let model = Self { coef, intercept };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if self.coef.is_empty() {
            return Err(PredictError::integrity("linear classifier has no classes"));
        }
        if self.coef.len() != self.intercept.len() {
            return Err(PredictError::integrity(format!(
                "linear classifier has {} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }
        for (k, row) in self.coef.iter().enumerate() {
            if row.len() != DerivedFeatures::NUM_FEATURES {
                return Err(PredictError::integrity(format!(
                    "coefficient row {k} has {} weights, expected {}",
                    row.len(),
                    DerivedFeatures::NUM_FEATURES
                )));
            }
            if let Some(i) = row.iter().position(|w| !w.is_finite()) {
                return Err(PredictError::integrity(format!(
                    "coefficient [{k}][{i}] is not finite"
                )));
            }
        }
        if let Some(k) = self.intercept.iter().position(|b| !b.is_finite()) {
            return Err(PredictError::integrity(format!("intercept {k} is not finite")));
        }
        Ok(())
    }

    /// Raw per-class scores.
    pub fn scores(&self, features: &NormalizedFeatures) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| {
                row.iter()
                    .zip(features.as_array())
                    .fold(*b, |acc, (w, x)| acc + w * x)
            })
            .collect()
    }
}

impl Classifier for LinearClassifier {
    fn classify(&self, features: &NormalizedFeatures) -> Result<usize, PredictError> {
        argmax(&self.scores(features))
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.coef.len())
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// [`PositionNet`](crate::model::PositionNet) weights on the plain-`f32` path.
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    weights: RawWeights,
}

impl MlpClassifier {
    pub fn new(weights: RawWeights) -> Self {
        Self { weights }
    }
}

impl Classifier for MlpClassifier {
    fn classify(&self, features: &NormalizedFeatures) -> Result<usize, PredictError> {
        argmax(&self.weights.logits(&features.to_f32()))
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.weights.num_classes())
    }

    fn name(&self) -> &'static str {
        "mlp"
    }
}
