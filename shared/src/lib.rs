use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumCount, EnumIter};

// The 14 pathologies the classifier scores. Declaration order is the model
// output order; it also fixes the threshold table index and the
// serialization order of the predictions map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
)]
pub enum ConditionLabel {
    Cardiomegaly,
    Emphysema,
    Effusion,
    Hernia,
    Infiltration,
    Mass,
    Nodule,
    Atelectasis,
    Pneumothorax,
    #[serde(rename = "Pleural_Thickening")]
    #[strum(serialize = "Pleural_Thickening")]
    PleuralThickening,
    Pneumonia,
    Fibrosis,
    Edema,
    Consolidation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Assessment {
    Normal,
    Abnormal,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PredictionResponse {
    pub predictions: BTreeMap<ConditionLabel, f32>,
    pub detected_conditions: Vec<ConditionLabel>,
    pub primary: Assessment,
    pub confidence: u8,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub using_mock_model: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
