//! Affine scaling of derived features with parameters fitted at training time.

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::features::DerivedFeatures;

const N: usize = DerivedFeatures::NUM_FEATURES;

/// Per-dimension center/scale fitted at training time.
///
/// Stored in the artifact manifest so inference uses exactly the training
/// transform. No field names are kept: dimension `i` of the parameters
/// applies to dimension `i` of [`DerivedFeatures::to_array`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Build and validate a scaler.
    pub fn new(center: Vec<f64>, scale: Vec<f64>) -> Result<Self, PredictError> {
        let scaler = Self { center, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Identity transform (center 0, scale 1).
    pub fn identity() -> Self {
        Self {
            center: vec![0.0; N],
            scale: vec![1.0; N],
        }
    }

    /// Check dimensionality and that every parameter is usable.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.center.len() != N {
            return Err(PredictError::integrity(format!(
                "scaler center has {} elements, expected {N}",
                self.center.len()
            )));
        }
        if self.scale.len() != N {
            return Err(PredictError::integrity(format!(
                "scaler scale has {} elements, expected {N}",
                self.scale.len()
            )));
        }
        for i in 0..N {
            check_dimension(i, self.center[i], self.scale[i])?;
        }
        Ok(())
    }

    /// Apply `(x - center) / scale` to every dimension, in order.
    pub fn normalize(&self, features: &DerivedFeatures) -> Result<NormalizedFeatures, PredictError> {
        if self.center.len() != N || self.scale.len() != N {
            return Err(PredictError::integrity(format!(
                "scaler fitted on {} dimensions, expected {N}",
                self.center.len().min(self.scale.len())
            )));
        }

        let raw = features.to_array();
        let mut out = [0.0; N];
        for i in 0..N {
            check_dimension(i, self.center[i], self.scale[i])?;
            out[i] = (raw[i] - self.center[i]) / self.scale[i];
            // parameters are finite and non-zero here, so only input magnitude overflows
            if !out[i].is_finite() {
                return Err(PredictError::Validation {
                    missing: Vec::new(),
                    invalid: DerivedFeatures::sources(i).to_vec(),
                });
            }
        }
        Ok(NormalizedFeatures(out))
    }
}

fn check_dimension(i: usize, center: f64, scale: f64) -> Result<(), PredictError> {
    if !center.is_finite() {
        return Err(PredictError::integrity(format!(
            "scaler center for dimension {i} is not finite"
        )));
    }
    if scale == 0.0 || !scale.is_finite() {
        return Err(PredictError::integrity(format!(
            "scaler scale for dimension {i} is {scale}"
        )));
    }
    Ok(())
}

/// Derived features after scaling; same order and length as the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFeatures(pub [f64; N]);

impl NormalizedFeatures {
    pub fn as_array(&self) -> &[f64; N] {
        &self.0
    }

    /// Single-precision copy for the neural network path.
    pub fn to_f32(&self) -> [f32; N] {
        let mut out = [0.0_f32; N];
        for (o, &x) in out.iter_mut().zip(self.0.iter()) {
            *o = x as f32;
        }
        out
    }
}
