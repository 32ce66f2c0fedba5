use crate::dtos::{PredictRequest, PredictResponse};
use crate::error::PredictError;
use crate::preprocess::preprocess;
use crate::services::metrics;
use crate::startup::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::time::Instant;
use validator::Validate;

/// Decode, binarize, resize, normalize, classify.
#[tracing::instrument(skip_all)]
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, PredictError> {
    match run_prediction(&state, payload).await {
        Ok(response) => {
            metrics::record_prediction(response.digit, state.classifier.name());
            tracing::info!(
                digit = response.digit,
                classifier = state.classifier.name(),
                confidence = response.confidence,
                "Prediction successful"
            );
            Ok(Json(response))
        }
        Err(e) => {
            metrics::record_failure(e.stage());
            Err(e)
        }
    }
}

async fn run_prediction(
    state: &AppState,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<PredictResponse, PredictError> {
    let Json(request) = payload?;
    request.validate()?;

    let options = state.preprocess.clone();
    let classifier = state.classifier.clone();

    // Image decoding and the forward pass are CPU bound.
    let prediction = tokio::task::spawn_blocking(move || -> Result<_, PredictError> {
        let started = Instant::now();
        let input = preprocess(&request.image, &options)?;
        metrics::record_preprocess_duration(started.elapsed());

        let started = Instant::now();
        let prediction = classifier.classify(&input)?;
        metrics::record_inference_duration(started.elapsed());

        Ok(prediction)
    })
    .await??;

    Ok(PredictResponse::from(prediction))
}
