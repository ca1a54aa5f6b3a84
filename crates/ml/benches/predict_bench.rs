//! Benchmarks for the prediction path using criterion.

use std::sync::Arc;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map, Value};

use scout_ml::classifier::MlpClassifier;
use scout_ml::decoder::LabelDecoder;
use scout_ml::model::PositionNet;
use scout_ml::normalize::Scaler;
use scout_ml::{ArtifactBundle, PositionPredictor};

fn mlp_predictor() -> PositionPredictor {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let net = PositionNet::new(vb, 4).unwrap();
    let labels = ["Center Back", "Full Back", "Midfielder", "Striker"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let bundle = ArtifactBundle::new(
        Scaler::identity(),
        Box::new(MlpClassifier::new(net.extract_weights().unwrap())),
        LabelDecoder::new(labels).unwrap(),
    )
    .unwrap();
    PositionPredictor::new(Arc::new(bundle))
}

fn request() -> Map<String, Value> {
    json!({
        "weak_foot": 3, "pace": 85, "shooting": 40, "passing": 88,
        "dribbling": 90, "defending": 30, "physicality": 60, "height_cm": 175
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn bench_predict_fields(c: &mut Criterion) {
    let predictor = mlp_predictor();
    let body = request();
    c.bench_function("predict_fields_mlp", |b| {
        b.iter(|| predictor.predict_fields(black_box(&body)).unwrap())
    });
}

fn bench_validation_reject(c: &mut Criterion) {
    let predictor = mlp_predictor();
    let mut body = request();
    body.remove("pace");
    c.bench_function("predict_fields_missing_field", |b| {
        b.iter(|| predictor.predict_fields(black_box(&body)).unwrap_err())
    });
}

criterion_group!(benches, bench_predict_fields, bench_validation_reject);
criterion_main!(benches);
