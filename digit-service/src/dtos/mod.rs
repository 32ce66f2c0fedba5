pub mod predict;

pub use predict::{PredictErrorResponse, PredictRequest, PredictResponse};
