//! Digit classifiers.
//!
//! This module provides a trait-based abstraction over the model runtime,
//! allowing the HTTP layer to run against the burn CNN or a mock.

pub mod cnn;
pub mod mock;

pub use cnn::{BurnClassifier, MnistCnn};
pub use mock::MockClassifier;

use crate::preprocess::ModelInput;
use serde::Serialize;
use thiserror::Error;

/// Digits 0 through 9.
pub const NUM_CLASSES: usize = 10;

/// Error type for classifier operations.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Classifier unavailable")]
    Unavailable,
}

/// Top class of one classification together with the full distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub digit: u8,
    pub confidence: f32,
    pub probabilities: [f32; NUM_CLASSES],
}

impl Prediction {
    /// Build a prediction from a softmax output. The first maximum wins ties.
    pub fn from_probabilities(probs: &[f32]) -> Result<Self, ClassifierError> {
        let probabilities: [f32; NUM_CLASSES] = probs.try_into().map_err(|_| {
            ClassifierError::Inference(format!(
                "expected {} class scores, got {}",
                NUM_CLASSES,
                probs.len()
            ))
        })?;

        if let Some(bad) = probabilities.iter().find(|p| !p.is_finite()) {
            return Err(ClassifierError::Inference(format!(
                "model produced a non-finite score ({bad})"
            )));
        }

        let mut digit = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[digit] {
                digit = i;
            }
        }

        Ok(Self {
            digit: digit as u8,
            confidence: probabilities[digit],
            probabilities,
        })
    }
}

/// Trait for digit recognition backends.
///
/// `classify` is CPU bound; callers on the async runtime should move it to
/// the blocking pool.
pub trait DigitClassifier: Send + Sync {
    fn classify(&self, input: &ModelInput) -> Result<Prediction, ClassifierError>;

    /// Short backend name used in logs and metrics.
    fn name(&self) -> &str;

    /// Whether the classifier can currently serve requests.
    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_probability() {
        let probs = [0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.6, 0.07, 0.05];
        let prediction = Prediction::from_probabilities(&probs).unwrap();
        assert_eq!(prediction.digit, 7);
        assert_eq!(prediction.confidence, 0.6);
        assert_eq!(prediction.probabilities, probs);
    }

    #[test]
    fn first_index_wins_ties() {
        let probs = [0.0, 0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(Prediction::from_probabilities(&probs).unwrap().digit, 1);
    }

    #[test]
    fn rejects_wrong_class_count() {
        let err = Prediction::from_probabilities(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }

    #[test]
    fn rejects_nan_scores() {
        let mut probs = [0.1f32; NUM_CLASSES];
        probs[3] = f32::NAN;
        assert!(Prediction::from_probabilities(&probs).is_err());
    }
}
