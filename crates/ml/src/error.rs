//! Failure taxonomy for the prediction pipeline.

use serde::Serialize;

/// Coarse classification of a [`PredictError`], used by the HTTP layer to
/// pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The caller sent a malformed request.
    Validation,
    /// The loaded artifact disagrees with the feature schema or label range.
    Integrity,
    /// Anything else that went wrong during computation.
    Unknown,
}

/// Errors surfaced by [`PositionPredictor`](crate::predictor::PositionPredictor).
///
/// None of these are retried: the pipeline is pure, so the same input fails
/// the same way every time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    /// One or more required fields are missing or not numeric.
    #[error("invalid request: {}", describe_fields(.missing, .invalid))]
    Validation {
        missing: Vec<&'static str>,
        invalid: Vec<&'static str>,
    },
    /// The artifact is inconsistent with the pipeline's schema.
    #[error("model artifact integrity error: {0}")]
    ArtifactIntegrity(String),
    /// Unexpected computation failure.
    #[error("prediction failed: {0}")]
    Unknown(String),
}

impl PredictError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::ArtifactIntegrity(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::ArtifactIntegrity(_) => ErrorKind::Integrity,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

fn describe_fields(missing: &[&'static str], invalid: &[&'static str]) -> String {
    let mut parts = Vec::with_capacity(2);
    if !missing.is_empty() {
        parts.push(format!("missing field(s): {}", missing.join(", ")));
    }
    if !invalid.is_empty() {
        parts.push(format!("non-numeric field(s): {}", invalid.join(", ")));
    }
    parts.join("; ")
}
