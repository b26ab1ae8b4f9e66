use ndarray::{s, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::ConditionLabel;
use strum::EnumCount;

use super::{Classifier, ClassifierError};

// Fallback when no weights can be loaded. Behaves like an untrained
// network: probabilities are arbitrary but deterministic for a given
// instance and input.
pub struct StandInClassifier {
    // One (bias, gain) pair per condition, fixed at construction.
    weights: Vec<(f32, f32)>,
}

impl StandInClassifier {
    pub fn new() -> Self {
        Self::from_rng(&mut rand::rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed))
    }

    fn from_rng<R: Rng>(rng: &mut R) -> Self {
        let weights = (0..ConditionLabel::COUNT)
            .map(|_| {
                (
                    rng.random_range(-1.0f32..1.0),
                    rng.random_range(-1.0f32..1.0),
                )
            })
            .collect();
        Self { weights }
    }
}

impl Default for StandInClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for StandInClassifier {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let rows = input.dim().1;
        let bands = self.weights.len();

        // Each condition reads one horizontal band of the image, so scores
        // respond to image content even after standardization.
        let scores = self
            .weights
            .iter()
            .enumerate()
            .map(|(i, &(bias, gain))| {
                let start = i * rows / bands;
                let end = ((i + 1) * rows / bands).max(start + 1).min(rows);
                let band = input.slice(s![.., start..end, .., ..]);
                sigmoid(bias + gain * band.mean().unwrap_or(0.0))
            })
            .collect();
        Ok(scores)
    }

    fn name(&self) -> &str {
        "stand-in"
    }
}
