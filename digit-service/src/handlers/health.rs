use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "digit-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once a classifier that can serve requests is loaded.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if !state.classifier.is_ready() {
        tracing::warn!(classifier = state.classifier.name(), "Classifier not ready");
        return Err(AppError::ServiceUnavailable);
    }

    Ok(Json(json!({
        "status": "ready",
        "classifier": state.classifier.name()
    })))
}
