//! Smoke test: write an MLP artifact to disk, load it the way the server
//! does, and push requests through the full pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use serde_json::{json, Map, Value};

use scout_ml::artifact::{ClassifierSpec, Manifest};
use scout_ml::features::FEATURE_NAMES;
use scout_ml::model::PositionNet;
use scout_ml::normalize::Scaler;
use scout_ml::{ArtifactBundle, ErrorKind, PositionPredictor};

const LABELS: [&str; 4] = ["Center Back", "Full Back", "Midfielder", "Striker"];

/// Fresh (randomly initialised) network plus a plausible scaler.
fn write_mlp_artifact(dir: &std::path::Path) -> PathBuf {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    PositionNet::new(vb, LABELS.len()).unwrap();
    varmap.save(dir.join("position_model.safetensors")).unwrap();

    let manifest = Manifest {
        features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        scaler: Scaler::new(
            vec![3.0, 70.0, 55.0, 62.0, 65.0, 50.0, 68.0, 181.0, 60.0, 59.0],
            vec![0.7, 12.0, 15.0, 10.0, 11.0, 18.0, 9.0, 6.5, 11.5, 12.0],
        )
        .unwrap(),
        labels: LABELS.iter().map(|s| s.to_string()).collect(),
        classifier: ClassifierSpec::Mlp {
            weights: PathBuf::from("position_model.safetensors"),
        },
    };
    let path = dir.join("position_model.json");
    manifest.save(&path).unwrap();
    path
}

fn load_predictor() -> (tempfile::TempDir, PositionPredictor) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_mlp_artifact(dir.path());
    let bundle = ArtifactBundle::load(&path).unwrap();
    (dir, PositionPredictor::new(Arc::new(bundle)))
}

fn as_map(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[test]
fn smoke_end_to_end_returns_known_label() {
    let (_dir, predictor) = load_predictor();
    let body = as_map(json!({
        "weak_foot": 3, "pace": 85, "shooting": 40, "passing": 88,
        "dribbling": 90, "defending": 30, "physicality": 60, "height_cm": 175
    }));
    let p = predictor.predict_fields(&body).unwrap();
    assert!(LABELS.contains(&p.position.as_str()), "unexpected label {}", p.position);
}

#[test]
fn smoke_key_order_does_not_matter() {
    let (_dir, predictor) = load_predictor();
    let forward: Map<String, Value> = serde_json::from_str(
        r#"{"weak_foot":4,"pace":72,"shooting":81,"passing":64,"dribbling":77,
            "defending":41,"physicality":70,"height_cm":183}"#,
    )
    .unwrap();
    let shuffled: Map<String, Value> = serde_json::from_str(
        r#"{"height_cm":183,"physicality":70,"defending":41,"dribbling":77,
            "passing":64,"shooting":81,"pace":72,"weak_foot":4}"#,
    )
    .unwrap();
    assert_eq!(
        predictor.predict_fields(&forward).unwrap(),
        predictor.predict_fields(&shuffled).unwrap()
    );
}

#[test]
fn smoke_missing_field_is_validation_error() {
    let (_dir, predictor) = load_predictor();
    let body = as_map(json!({ "weak_foot": 3, "pace": 85 }));
    let err = predictor.predict_fields(&body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let msg = err.to_string();
    for field in ["shooting", "passing", "dribbling", "defending", "physicality", "height_cm"] {
        assert!(msg.contains(field), "{msg} should name {field}");
    }
}

#[test]
fn smoke_shared_across_threads() {
    let (_dir, predictor) = load_predictor();
    let predictor = Arc::new(predictor);
    let body = as_map(json!({
        "weak_foot": 2, "pace": 60, "shooting": 35, "passing": 55,
        "dribbling": 48, "defending": 84, "physicality": 80, "height_cm": 191
    }));
    let expected = predictor.predict_fields(&body).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let predictor = predictor.clone();
            let body = body.clone();
            std::thread::spawn(move || {
                (0..100)
                    .map(|_| predictor.predict_fields(&body).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for h in handles {
        for p in h.join().unwrap() {
            assert_eq!(p, expected);
        }
    }
}

#[test]
fn smoke_bundled_artifact() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../model/position_model.json");
    let predictor = PositionPredictor::new(Arc::new(ArtifactBundle::load(&path).unwrap()));

    let playmaker = as_map(json!({
        "weak_foot": 3, "pace": 85, "shooting": 40, "passing": 88,
        "dribbling": 90, "defending": 30, "physicality": 60, "height_cm": 175
    }));
    assert_eq!(predictor.predict_fields(&playmaker).unwrap().position, "Midfielder");

    let stopper = as_map(json!({
        "weak_foot": 2, "pace": 55, "shooting": 30, "passing": 45,
        "dribbling": 35, "defending": 88, "physicality": 86, "height_cm": 192
    }));
    assert_eq!(predictor.predict_fields(&stopper).unwrap().position, "Center Back");
}
