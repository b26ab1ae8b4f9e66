use shared::ConditionLabel;
use std::env;
use strum::EnumCount;

// Model input edge length; uploads are resized to INPUT_SIZE x INPUT_SIZE.
pub const INPUT_SIZE: u32 = 256;

// Added to the per-image standard deviation so flat images do not divide by zero.
pub const EPSILON: f32 = 1e-7;

pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// Tuned per-condition cutoffs, indexed by ConditionLabel declaration order.
pub const THRESHOLDS: [f32; ConditionLabel::COUNT] = [
    0.912609, 0.5, 0.05536364, 0.05458658, 0.05614194, 0.0711029, 0.09037294,
    0.06575287, 0.06672161, 0.05656851, 0.05656851, 0.04054752, 0.0392803,
    0.05642475,
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: String,
    pub model_path: String,
    pub static_dir: String,
    pub cors_allowed_origin: String,
    pub strict_model_load: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());

        let model_path = env::var("MODEL_PATH")
            .unwrap_or_else(|_| "models/chest-xray-densenet.onnx".to_string());

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| {
            if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
                format!("{}/static", manifest_dir)
            } else {
                "./static".to_string()
            }
        });

        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let strict_model_load = env::var("MODEL_LOAD_STRICT")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            port,
            model_path,
            static_dir,
            cors_allowed_origin,
            strict_model_load,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

// Run once at startup; the table length is enforced by the type.
pub fn validate_thresholds() -> Result<(), String> {
    for (i, t) in THRESHOLDS.iter().enumerate() {
        if !(0.0..=1.0).contains(t) {
            return Err(format!(
                "threshold at index {} is {} (expected a probability in [0, 1])",
                i, t
            ));
        }
    }
    Ok(())
}
