use ndarray::Array4;
use tract_onnx::prelude::*;

use super::{check_output_len, Classifier, ClassifierError};

// Running a plan only borrows it, so one instance serves every worker
// thread without locking.
pub type OnnxPlan = TypedRunnableModel<TypedModel>;

pub struct OnnxClassifier {
    plan: OnnxPlan,
}

impl OnnxClassifier {
    pub fn new(plan: OnnxPlan) -> Self {
        Self { plan }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let layout = input.as_standard_layout();
        let data = layout
            .as_slice()
            .ok_or_else(|| ClassifierError::Inference("input tensor is not contiguous".into()))?;
        let (n, h, w, c) = input.dim();
        let tensor = Tensor::from_shape(&[n, h, w, c], data)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        check_output_len(scores.iter().copied().collect())
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
