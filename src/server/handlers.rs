//! Request handlers

use crate::preprocessing::Record;
use crate::server::error::{Result, ServerError};
use crate::server::state::AppState;
use axum::{extract::State, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// `POST /api/predict` — predict one record.
///
/// The body is a JSON object mapping every schema column to a value (null
/// allowed). Malformed records come back as 400 with the offending columns
/// named; they never affect other in-flight requests.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<Record>,
) -> Result<Json<serde_json::Value>> {
    let prediction = state.service.predict(&record)?;

    Ok(Json(json!({
        "label": prediction.label,
        "confidence": prediction.confidence,
    })))
}

/// `GET /api/model` — schema and selection record of the served artifact.
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let artifact = state.service.artifact();

    let (numeric, categorical) = match artifact.router.schema() {
        Some(schema) => (schema.numeric().to_vec(), schema.categorical().to_vec()),
        None => (Vec::new(), Vec::new()),
    };

    Json(json!({
        "classifier": artifact.classifier.name(),
        "trained_at": artifact.trained_at.clone(),
        "schema": {
            "numeric": numeric,
            "categorical": categorical,
        },
        "feature_count": artifact.router.output_dim(),
        "evaluations": artifact.evaluations.clone(),
    }))
}

/// `POST /api/reload` — atomically swap in the artifact currently on disk.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    state
        .service
        .reload_from_path(&state.config.artifact_path)
        .map_err(ServerError::Pipeline)?;

    info!(path = %state.config.artifact_path.display(), "artifact reloaded");

    Ok(Json(json!({
        "success": true,
        "trained_at": state.service.artifact().trained_at.clone(),
    })))
}

/// `GET /api/health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "classifier": state.service.artifact().classifier.name(),
    }))
}
