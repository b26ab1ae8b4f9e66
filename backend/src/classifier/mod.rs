use ndarray::Array4;
use shared::ConditionLabel;
use strum::EnumCount;

pub mod loader;
pub mod onnx;
pub mod stand_in;

pub use loader::{load, LoadPolicy};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model inference error: {0}")]
    Inference(String),
    #[error("Model returned {got} scores, expected {expected}")]
    OutputShape { got: usize, expected: usize },
}

// Scores a batched image tensor: one probability per condition, in label
// declaration order.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError>;

    fn name(&self) -> &str;
}

pub(crate) fn check_output_len(scores: Vec<f32>) -> Result<Vec<f32>, ClassifierError> {
    if scores.len() != ConditionLabel::COUNT {
        return Err(ClassifierError::OutputShape {
            got: scores.len(),
            expected: ConditionLabel::COUNT,
        });
    }
    Ok(scores)
}

// How the serving classifier was obtained; feeds the health endpoint and
// the stand-in marker on predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Loaded { strategy: &'static str },
    StandIn,
}

impl ModelStatus {
    pub fn model_loaded(&self) -> bool {
        matches!(self, ModelStatus::Loaded { .. })
    }

    pub fn is_stand_in(&self) -> bool {
        matches!(self, ModelStatus::StandIn)
    }
}
