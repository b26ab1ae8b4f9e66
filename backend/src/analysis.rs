use std::collections::BTreeMap;

use shared::{Assessment, ConditionLabel, PredictionResponse};
use strum::{EnumCount, IntoEnumIterator};

use crate::config::THRESHOLDS;

pub fn summarize(probabilities: &[f32]) -> PredictionResponse {
    summarize_with(probabilities, &THRESHOLDS)
}

// A condition is reported when its probability meets or exceeds its
// threshold; confidence is the top probability as a truncated percentage.
pub fn summarize_with(
    probabilities: &[f32],
    thresholds: &[f32; ConditionLabel::COUNT],
) -> PredictionResponse {
    let mut predictions = BTreeMap::new();
    let mut detected_conditions = Vec::new();
    let mut top_probability = 0.0f32;

    for (i, label) in ConditionLabel::iter().enumerate() {
        let probability = probabilities.get(i).copied().unwrap_or(0.0);
        predictions.insert(label, probability);

        if probability > top_probability {
            top_probability = probability;
        }
        if probability >= thresholds[i] {
            detected_conditions.push(label);
        }
    }

    let confidence = (top_probability * 100.0).floor() as u8;

    let (primary, description) = if detected_conditions.is_empty() {
        (
            Assessment::Normal,
            "No signs of lung disease detected.".to_string(),
        )
    } else {
        let joined = detected_conditions
            .iter()
            .map(|label| label.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        (
            Assessment::Abnormal,
            format!("Signs of lung disease detected: {}", joined),
        )
    };

    PredictionResponse {
        predictions,
        detected_conditions,
        primary,
        confidence,
        description,
    }
}
