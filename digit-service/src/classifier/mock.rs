//! Mock classifier for testing.

use super::{ClassifierError, DigitClassifier, Prediction, NUM_CLASSES};
use crate::preprocess::ModelInput;

enum Behaviour {
    Fixed { digit: u8, confidence: f32 },
    Failing,
    Unavailable,
}

/// Deterministic classifier that ignores its input. Test use only.
pub struct MockClassifier {
    behaviour: Behaviour,
}

impl MockClassifier {
    /// Always answers `digit` with `confidence`; the remainder is spread evenly.
    /// Both are clamped into range.
    pub fn new(digit: u8, confidence: f32) -> Self {
        Self {
            behaviour: Behaviour::Fixed {
                digit: digit.min((NUM_CLASSES - 1) as u8),
                confidence: confidence.clamp(0.0, 1.0),
            },
        }
    }

    /// Every call fails as if the forward pass broke.
    pub fn failing() -> Self {
        Self {
            behaviour: Behaviour::Failing,
        }
    }

    /// Reports not ready and refuses every call.
    pub fn unavailable() -> Self {
        Self {
            behaviour: Behaviour::Unavailable,
        }
    }
}

impl DigitClassifier for MockClassifier {
    fn classify(&self, _input: &ModelInput) -> Result<Prediction, ClassifierError> {
        match self.behaviour {
            Behaviour::Fixed { digit, confidence } => {
                let rest = (1.0 - confidence) / (NUM_CLASSES - 1) as f32;
                let mut probs = [rest; NUM_CLASSES];
                probs[digit as usize] = confidence;
                Ok(Prediction {
                    digit,
                    confidence,
                    probabilities: probs,
                })
            }
            Behaviour::Failing => Err(ClassifierError::Inference(
                "mock classifier configured to fail".to_string(),
            )),
            Behaviour::Unavailable => Err(ClassifierError::Unavailable),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn is_ready(&self) -> bool {
        !matches!(self.behaviour, Behaviour::Unavailable)
    }
}
