//! Request-facing inference wrapper.
//!
//! [`PositionPredictor`] runs one request through
//! `Validating → Transforming → Predicted`, ending in `Rejected` on the first
//! failure. It holds only an `Arc` to the immutable [`ArtifactBundle`], so a
//! single predictor is shared by every concurrent request without locking.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::artifact::ArtifactBundle;
use crate::error::PredictError;
use crate::features::RawPlayerAttributes;

/// Pipeline progress, recorded in trace logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Transforming,
    Predicted,
    Rejected,
}

/// Successful outcome: the decoded position label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub position: String,
}

#[derive(Debug, Clone)]
pub struct PositionPredictor {
    artifact: Arc<ArtifactBundle>,
}

impl PositionPredictor {
    pub fn new(artifact: Arc<ArtifactBundle>) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ArtifactBundle {
        &self.artifact
    }

    /// Validate an untrusted, field-name-keyed request body and predict.
    pub fn predict_fields(&self, fields: &Map<String, Value>) -> Result<Prediction, PredictError> {
        tracing::trace!(stage = ?Stage::Validating, "predict");
        let raw = RawPlayerAttributes::from_fields(fields).inspect_err(reject)?;
        self.run(&raw)
    }

    /// Predict from already-typed attributes.
    pub fn predict(&self, raw: &RawPlayerAttributes) -> Result<Prediction, PredictError> {
        self.run(raw)
    }

    fn run(&self, raw: &RawPlayerAttributes) -> Result<Prediction, PredictError> {
        tracing::trace!(stage = ?Stage::Transforming, "predict");
        let result = self.transform(raw);
        match &result {
            Ok(p) => tracing::trace!(stage = ?Stage::Predicted, position = %p.position, "predict"),
            Err(e) => reject(e),
        }
        result
    }

    fn transform(&self, raw: &RawPlayerAttributes) -> Result<Prediction, PredictError> {
        let derived = raw.derive()?;
        let normalized = self.artifact.scaler().normalize(&derived)?;
        let index = self.artifact.classifier().classify(&normalized)?;
        let label = self.artifact.decoder().decode(index)?;
        Ok(Prediction {
            position: label.to_string(),
        })
    }
}

fn reject(err: &PredictError) {
    match err {
        PredictError::Validation { .. } => {
            tracing::debug!(stage = ?Stage::Rejected, kind = ?err.kind(), error = %err, "predict")
        }
        _ => tracing::error!(stage = ?Stage::Rejected, kind = ?err.kind(), error = %err, "predict"),
    }
}
