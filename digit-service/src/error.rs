//! Failures of the `/predict` route and their HTTP rendering.

use crate::classifier::ClassifierError;
use crate::dtos::PredictErrorResponse;
use crate::preprocess::PreprocessError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("prediction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for PredictError {
    fn from(rejection: JsonRejection) -> Self {
        // Oversized bodies and wrong content types keep their own status; any
        // other body problem is the client's malformed request.
        let status = match rejection.status() {
            s @ (StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE) => s,
            _ => StatusCode::BAD_REQUEST,
        };
        PredictError::Rejected {
            status,
            message: rejection.body_text(),
        }
    }
}

impl PredictError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::Rejected { status, .. } => *status,
            PredictError::Validation(_) => StatusCode::BAD_REQUEST,
            PredictError::Preprocess(PreprocessError::ImageTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            PredictError::Preprocess(PreprocessError::EmptyImage) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::Preprocess(_) => StatusCode::BAD_REQUEST,
            PredictError::Classifier(ClassifierError::Unavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PredictError::Classifier(_) | PredictError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Pipeline stage that failed, used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            PredictError::Rejected { .. } | PredictError::Validation(_) => "request",
            PredictError::Preprocess(_) => "preprocess",
            PredictError::Classifier(_) | PredictError::Task(_) => "inference",
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, stage = self.stage(), "Prediction failed");
            match self {
                PredictError::Classifier(ClassifierError::Unavailable) => {
                    "Model is not available".to_string()
                }
                _ => "Internal error while running the model".to_string(),
            }
        } else {
            tracing::warn!(error = %self, stage = self.stage(), "Prediction request rejected");
            self.to_string()
        };

        (status, Json(PredictErrorResponse::new(error))).into_response()
    }
}
