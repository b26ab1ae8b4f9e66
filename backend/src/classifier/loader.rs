use std::path::{Path, PathBuf};
use std::sync::Arc;

use tract_onnx::prelude::*;

use super::onnx::{OnnxClassifier, OnnxPlan};
use super::stand_in::StandInClassifier;
use super::{Classifier, ModelStatus};
use crate::config::INPUT_SIZE;

// Whether a load failure aborts startup or degrades to the stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    Strict,
    AllowStandIn,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model file not found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to load model from {path}: {detail}")]
    Exhausted { path: PathBuf, detail: String },
}

// Tried in order. Exported models do not always carry a usable input
// shape, and some graphs only run with the optimizer skipped.
const STRATEGIES: [(&str, fn(&Path) -> TractResult<OnnxPlan>); 3] = [
    ("declared-shape", load_declared_shape),
    ("inferred-shape", load_inferred_shape),
    ("unoptimized", load_unoptimized),
];

fn input_fact() -> InferenceFact {
    let size = INPUT_SIZE as usize;
    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, size, size, 3))
}

fn load_declared_shape(path: &Path) -> TractResult<OnnxPlan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, input_fact())?
        .into_optimized()?
        .into_runnable()
}

fn load_inferred_shape(path: &Path) -> TractResult<OnnxPlan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .into_optimized()?
        .into_runnable()
}

fn load_unoptimized(path: &Path) -> TractResult<OnnxPlan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, input_fact())?
        .into_typed()?
        .into_runnable()
}

// Never fails under AllowStandIn: when no strategy works the stand-in
// serves and the status records it.
pub fn load(
    path: &Path,
    policy: LoadPolicy,
) -> Result<(Arc<dyn Classifier>, ModelStatus), ModelLoadError> {
    match try_load(path) {
        Ok(loaded) => Ok(loaded),
        Err(err) => match policy {
            LoadPolicy::Strict => Err(err),
            LoadPolicy::AllowStandIn => {
                log::warn!("{}. Serving an untrained stand-in model instead.", err);
                Ok((Arc::new(StandInClassifier::new()), ModelStatus::StandIn))
            }
        },
    }
}

fn try_load(path: &Path) -> Result<(Arc<dyn Classifier>, ModelStatus), ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::NotFound(path.to_path_buf()));
    }

    let mut first_failure = None;
    for (strategy, attempt) in STRATEGIES {
        match attempt(path) {
            Ok(plan) => {
                log::info!("Model loaded from {} ({})", path.display(), strategy);
                return Ok((
                    Arc::new(OnnxClassifier::new(plan)),
                    ModelStatus::Loaded { strategy },
                ));
            }
            Err(e) => {
                log::warn!("Loading with {} failed: {}", strategy, e);
                first_failure.get_or_insert(e.to_string());
            }
        }
    }

    Err(ModelLoadError::Exhausted {
        path: path.to_path_buf(),
        detail: first_failure.unwrap_or_else(|| "no strategies attempted".to_string()),
    })
}
