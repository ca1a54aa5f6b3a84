//! The trained artifact bundle and its on-disk manifest.
//!
//! A bundle is loaded once at startup, checked for internal consistency and
//! then shared read-only (behind an `Arc`) by every request. The manifest is
//! a JSON file:
//!
//! ```json
//! {
//!   "features": ["weak_foot", "pace", ..., "attacking", "defensive"],
//!   "scaler": { "center": [...], "scale": [...] },
//!   "labels": ["Center Back", "Midfielder", "Striker"],
//!   "classifier": { "kind": "mlp", "weights": "position_model.safetensors" }
//! }
//! ```
//!
//! `"kind": "linear"` carries `coef` and `intercept` inline instead. A
//! relative `weights` path is resolved against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, LinearClassifier, MlpClassifier};
use crate::decoder::LabelDecoder;
use crate::error::PredictError;
use crate::features::FEATURE_NAMES;
use crate::model::PositionNet;
use crate::normalize::Scaler;

/// Serialized form of the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Feature names in the order the scaler and classifier were fitted on.
    pub features: Vec<String>,
    pub scaler: Scaler,
    pub labels: Vec<String>,
    pub classifier: ClassifierSpec,
}

/// Which classifier family the manifest describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClassifierSpec {
    Linear(LinearClassifier),
    Mlp { weights: PathBuf },
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading model manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&data)
            .with_context(|| format!("parsing model manifest {}", path.display()))?;
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Fitted scaler, classifier and label decoder, checked against each other.
pub struct ArtifactBundle {
    scaler: Scaler,
    classifier: Box<dyn Classifier>,
    decoder: LabelDecoder,
}

impl ArtifactBundle {
    /// Assemble a bundle from already-fitted parts.
    ///
    /// Fails if the scaler is unusable or the classifier's class count
    /// disagrees with the decoder.
    pub fn new(
        scaler: Scaler,
        classifier: Box<dyn Classifier>,
        decoder: LabelDecoder,
    ) -> Result<Self, PredictError> {
        scaler.validate()?;
        if let Some(k) = classifier.num_classes() {
            if k != decoder.len() {
                return Err(PredictError::integrity(format!(
                    "{} classifier emits {k} classes but the decoder has {} labels",
                    classifier.name(),
                    decoder.len()
                )));
            }
        }
        Ok(Self {
            scaler,
            classifier,
            decoder,
        })
    }

    /// Load and check the bundle described by a manifest file.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::from_file(manifest_path)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest(manifest, base)
    }

    /// Build from a parsed manifest; `base` resolves relative weight paths.
    pub fn from_manifest(manifest: Manifest, base: &Path) -> Result<Self> {
        check_feature_order(&manifest.features)?;
        let decoder = LabelDecoder::new(manifest.labels)?;

        let classifier: Box<dyn Classifier> = match manifest.classifier {
            ClassifierSpec::Linear(model) => {
                model.validate()?;
                Box::new(model)
            }
            ClassifierSpec::Mlp { weights } => {
                let path = if weights.is_absolute() {
                    weights
                } else {
                    base.join(weights)
                };
                tracing::info!(?path, "loading classifier weights");
                let net = PositionNet::load(&path, decoder.len(), &Device::Cpu)
                    .map_err(|e| PredictError::integrity(format!("{e:#}")))?;
                // candle model dropped here; only the raw weights are kept
                Box::new(MlpClassifier::new(net.extract_weights()?))
            }
        };

        let bundle = Self::new(manifest.scaler, classifier, decoder)?;
        tracing::info!(
            classifier = bundle.classifier.name(),
            labels = ?bundle.decoder.labels(),
            "model artifact loaded"
        );
        Ok(bundle)
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn decoder(&self) -> &LabelDecoder {
        &self.decoder
    }
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("classifier", &self.classifier.name())
            .field("labels", &self.decoder.labels())
            .finish()
    }
}

/// Training frames often use display names ("Weak Foot", "Height_cm").
fn canonical(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// The scaler has no names, only positions, so the manifest's order must be
/// exactly ours.
fn check_feature_order(features: &[String]) -> Result<(), PredictError> {
    if features.len() != FEATURE_NAMES.len() {
        return Err(PredictError::integrity(format!(
            "artifact was trained on {} features, expected {}",
            features.len(),
            FEATURE_NAMES.len()
        )));
    }
    for (i, (got, want)) in features.iter().zip(FEATURE_NAMES).enumerate() {
        if canonical(got) != want {
            return Err(PredictError::integrity(format!(
                "artifact feature {i} is {got:?}, expected {want:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::{VarBuilder, VarMap};

    fn labels() -> Vec<String> {
        vec!["Center Back".into(), "Midfielder".into(), "Striker".into()]
    }

    fn feature_names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn linear_manifest() -> Manifest {
        Manifest {
            features: feature_names(),
            scaler: Scaler::identity(),
            labels: labels(),
            classifier: ClassifierSpec::Linear(LinearClassifier {
                coef: vec![vec![0.0; 10], vec![0.0; 10], vec![0.0; 10]],
                intercept: vec![0.0, 1.0, 0.0],
            }),
        }
    }

    #[test]
    fn test_linear_manifest_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position_model.json");
        linear_manifest().save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"kind\": \"linear\""));

        let bundle = ArtifactBundle::load(&path).unwrap();
        assert_eq!(bundle.classifier().name(), "linear");
        assert_eq!(bundle.decoder().len(), 3);
    }

    #[test]
    fn test_mlp_manifest_resolves_relative_weights() {
        let dir = tempfile::tempdir().unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        PositionNet::new(vb, 3).unwrap();
        varmap.save(dir.path().join("net.safetensors")).unwrap();

        let mut manifest = linear_manifest();
        manifest.classifier = ClassifierSpec::Mlp {
            weights: PathBuf::from("net.safetensors"),
        };
        let path = dir.path().join("position_model.json");
        manifest.save(&path).unwrap();

        let bundle = ArtifactBundle::load(&path).unwrap();
        assert_eq!(bundle.classifier().name(), "mlp");
        assert_eq!(bundle.classifier().num_classes(), Some(3));
    }

    #[test]
    fn test_mlp_class_count_mismatch_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        PositionNet::new(vb, 4).unwrap();
        varmap.save(dir.path().join("net.safetensors")).unwrap();

        let mut manifest = linear_manifest();
        manifest.classifier = ClassifierSpec::Mlp {
            weights: PathBuf::from("net.safetensors"),
        };
        let err = ArtifactBundle::from_manifest(manifest, dir.path()).unwrap_err();
        let predict_err = err.downcast_ref::<PredictError>().expect("typed error");
        assert!(matches!(predict_err, PredictError::ArtifactIntegrity(_)));
    }

    #[test]
    fn test_mlp_nan_bias_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        PositionNet::new(vb, 3).unwrap();
        let bad = candle_core::Tensor::new(&[f32::NAN, 0.0, 0.0], &Device::Cpu).unwrap();
        varmap.data().lock().unwrap()["fc3.bias"].set(&bad).unwrap();
        varmap.save(dir.path().join("net.safetensors")).unwrap();

        let mut manifest = linear_manifest();
        manifest.classifier = ClassifierSpec::Mlp {
            weights: PathBuf::from("net.safetensors"),
        };
        let path = dir.path().join("position_model.json");
        manifest.save(&path).unwrap();

        let err = ArtifactBundle::load(&path).unwrap_err();
        let predict_err = err.downcast_ref::<PredictError>().expect("typed error");
        assert!(matches!(predict_err, PredictError::ArtifactIntegrity(_)), "got {err:#}");
        assert!(err.to_string().contains("fc3.bias[0]"), "got {err:#}");
    }

    #[test]
    fn test_linear_nan_coefficient_fails_at_load() {
        let mut manifest = linear_manifest();
        if let ClassifierSpec::Linear(model) = &mut manifest.classifier {
            model.coef[2][9] = f64::NAN;
        }
        let err = ArtifactBundle::from_manifest(manifest, Path::new(".")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictError>(),
            Some(PredictError::ArtifactIntegrity(_))
        ));
    }

    #[test]
    fn test_feature_order_mismatch_rejected() {
        let mut manifest = linear_manifest();
        manifest.features.swap(8, 9);
        let err = ArtifactBundle::from_manifest(manifest, Path::new(".")).unwrap_err();
        assert!(format!("{err}").contains("feature 8"), "got {err}");
    }

    #[test]
    fn test_feature_count_mismatch_rejected() {
        let mut manifest = linear_manifest();
        manifest.features.push("extra".into());
        assert!(ArtifactBundle::from_manifest(manifest, Path::new(".")).is_err());
    }

    #[test]
    fn test_training_display_names_accepted() {
        let mut manifest = linear_manifest();
        manifest.features[0] = "Weak Foot".into();
        manifest.features[7] = "Height_cm".into();
        manifest.features[8] = "Attacking".into();
        assert!(ArtifactBundle::from_manifest(manifest, Path::new(".")).is_ok());
    }

    #[test]
    fn test_linear_class_count_mismatch() {
        let scaler = Scaler::identity();
        let model = LinearClassifier::new(vec![vec![0.0; 10]; 2], vec![0.0; 2]).unwrap();
        let decoder = LabelDecoder::new(labels()).unwrap();
        let err = ArtifactBundle::new(scaler, Box::new(model), decoder).unwrap_err();
        assert!(err.to_string().contains("emits 2 classes"));
    }

    #[test]
    fn test_missing_manifest() {
        assert!(ArtifactBundle::load(Path::new("/nonexistent/position_model.json")).is_err());
    }
}
