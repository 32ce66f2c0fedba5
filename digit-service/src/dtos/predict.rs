use crate::classifier::{Prediction, NUM_CLASSES};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const SUCCESS_MESSAGE: &str = "Prediction successful";
pub const FAILURE_MESSAGE: &str = "Error processing prediction";

#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    /// Canvas export, `data:image/png;base64,...`, or bare base64.
    #[validate(length(min = 1, message = "image cannot be empty"))]
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub digit: u8,
    pub confidence: f32,
    pub probabilities: [f32; NUM_CLASSES],
    pub message: String,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            success: true,
            digit: prediction.digit,
            confidence: prediction.confidence,
            probabilities: prediction.probabilities,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl PredictErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: FAILURE_MESSAGE.to_string(),
        }
    }
}
