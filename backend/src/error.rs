use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::classifier::ClassifierError;

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No image uploaded")]
    MissingInput,
    #[error("No file selected")]
    EmptyFilename,
    #[error("File type not supported. Please upload a PNG or JPEG image")]
    UnsupportedFileType,
    #[error("File too large")]
    PayloadTooLarge,
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Decode(#[from] image::ImageError),
    #[error("{0}")]
    Inference(String),
}

impl From<ClassifierError> for PredictError {
    fn from(err: ClassifierError) -> Self {
        PredictError::Inference(err.to_string())
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingInput
            | PredictError::EmptyFilename
            | PredictError::UnsupportedFileType
            | PredictError::Upload(_) => StatusCode::BAD_REQUEST,
            PredictError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Io(_) | PredictError::Decode(_) | PredictError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
