//! HTTP server for position prediction.
//!
//! Routes:
//! - `POST /predict` — `{"position": ...}` or `{"error": ...}`
//! - `GET /health` — model guard status, 503 once degraded
//! - `GET /model` — feature order, labels and classifier family
//! - `GET /metrics` — Prometheus-style text counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use scout_ml::features::FEATURE_NAMES;
use scout_ml::{ErrorKind, PositionPredictor, PredictError, Prediction};

use crate::guard::ModelGuard;

/// Request outcome counters.
#[derive(Debug, Default)]
pub struct Metrics {
    pub predictions: AtomicU64,
    pub validation_errors: AtomicU64,
    pub integrity_errors: AtomicU64,
    pub unknown_errors: AtomicU64,
}

impl Metrics {
    fn record_error(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::Validation => &self.validation_errors,
            ErrorKind::Integrity => &self.integrity_errors,
            ErrorKind::Unknown => &self.unknown_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared state for all handlers.
pub struct AppState {
    pub predictor: PositionPredictor,
    pub guard: ModelGuard,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(predictor: PositionPredictor) -> Self {
        Self {
            predictor,
            guard: ModelGuard::new(),
            metrics: Metrics::default(),
        }
    }
}

/// JSON body for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON response for `/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub reason: Option<String>,
}

/// JSON response for `/model`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelResponse {
    pub features: Vec<String>,
    pub labels: Vec<String>,
    pub classifier: String,
}

/// A failed request: status code plus the `{"error"}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<&PredictError> for ApiError {
    fn from(err: &PredictError) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Integrity | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Build the axum router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .route("/model", get(model_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// `POST /predict` — run one request through the pipeline.
///
/// The pipeline is synchronous and bounded, so it runs inline on the
/// handler task.
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(fields) = body.map_err(|rejection| {
        state.metrics.record_error(ErrorKind::Validation);
        ApiError::bad_request(format!(
            "invalid request: body must be a JSON object ({})",
            rejection.body_text()
        ))
    })?;

    let result = state
        .guard
        .check()
        .and_then(|()| state.predictor.predict_fields(&fields));

    match result {
        Ok(prediction) => {
            state.metrics.predictions.fetch_add(1, Ordering::Relaxed);
            Ok(Json(prediction))
        }
        Err(err) => {
            state.metrics.record_error(err.kind());
            if let PredictError::ArtifactIntegrity(reason) = &err {
                state.guard.trip(reason.clone());
            }
            Err(ApiError::from(&err))
        }
    }
}

/// `GET /health` — 200 while the model is usable, 503 after an integrity fault.
async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let status = state.guard.status();
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: if status.healthy { "ok" } else { "degraded" }.to_string(),
            reason: status.reason,
        }),
    )
}

/// `GET /model` — describe the loaded artifact.
async fn model_handler(State(state): State<Arc<AppState>>) -> Json<ModelResponse> {
    let artifact = state.predictor.artifact();
    Json(ModelResponse {
        features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        labels: artifact.decoder().labels().to_vec(),
        classifier: artifact.classifier().name().to_string(),
    })
}

/// `GET /metrics` — simple Prometheus-style text metrics.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    let m = &state.metrics;
    let counters = [
        ("scout_predictions_total", "Successful predictions", &m.predictions),
        ("scout_validation_errors_total", "Rejected malformed requests", &m.validation_errors),
        ("scout_integrity_errors_total", "Model artifact integrity faults", &m.integrity_errors),
        ("scout_unknown_errors_total", "Unexpected prediction failures", &m.unknown_errors),
    ];

    let mut out = String::new();
    for (name, help, counter) in counters {
        out.push_str(&format!(
            "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
            counter.load(Ordering::Relaxed)
        ));
    }
    out.push_str(&format!(
        "# HELP scout_model_healthy Whether the loaded model is usable\n\
         # TYPE scout_model_healthy gauge\n\
         scout_model_healthy {}\n",
        if state.guard.is_healthy() { 1 } else { 0 }
    ));
    out
}

/// Serve on an already-bound listener until `cancel` fires.
pub async fn run_server(
    state: Arc<AppState>,
    listener: TcpListener,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;

    Ok(())
}
