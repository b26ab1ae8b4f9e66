use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use shared::HealthResponse;
use uuid::Uuid;

use crate::analysis;
use crate::classifier::{Classifier, ModelStatus};
use crate::config::MAX_UPLOAD_BYTES;
use crate::error::PredictError;
use crate::preprocess;
use crate::upload::{has_allowed_extension, TempUpload, UploadedImage};

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: String) {
    cfg.service(web::resource("/api/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/api/health").route(web::get().to(handle_health)))
        .service(Files::new("/", static_dir).index_file("index.html"));
}

async fn handle_predict(
    classifier: web::Data<dyn Classifier>,
    status: web::Data<ModelStatus>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let request_id = Uuid::new_v4();

    let upload = read_image_field(payload, request_id).await?;
    info!(
        "[{}] Received {} ({} bytes)",
        request_id, upload.filename, upload.size
    );

    let tensor = preprocess::prepare(upload.path()).map_err(|e| {
        error!("[{}] Failed to decode image: {}", request_id, e);
        PredictError::from(e)
    })?;
    drop(upload);

    let model = classifier.clone();
    let probabilities = web::block(move || model.predict(&tensor))
        .await
        .map_err(|e| PredictError::Inference(e.to_string()))?
        .map_err(|e| {
            error!("[{}] {}", request_id, e);
            PredictError::from(e)
        })?;

    let response = analysis::summarize(&probabilities);
    info!(
        "[{}] {} assessment: {} (confidence {})",
        request_id,
        classifier.name(),
        response.primary,
        response.confidence
    );

    let mut builder = HttpResponse::Ok();
    if status.is_stand_in() {
        builder.insert_header(("x-model-mode", "stand-in"));
    }
    Ok(builder.json(response))
}

// Walks the payload until the `image` field is found and spools its bytes
// to disk; other fields are skipped.
async fn read_image_field(
    mut payload: Multipart,
    request_id: Uuid,
) -> Result<UploadedImage, PredictError> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|name| name.to_string())
            .unwrap_or_default();
        if filename.is_empty() {
            return Err(PredictError::EmptyFilename);
        }
        if !has_allowed_extension(&filename) {
            return Err(PredictError::UnsupportedFileType);
        }

        let mut spool = TempUpload::new(request_id)?;
        let mut received = 0usize;
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| PredictError::Upload(e.to_string()))?;
            received += data.len();
            if received > MAX_UPLOAD_BYTES {
                return Err(PredictError::PayloadTooLarge);
            }
            spool.write_all(&data)?;
        }

        return Ok(UploadedImage::new(filename, received, spool));
    }

    Err(PredictError::MissingInput)
}

async fn handle_health(status: web::Data<ModelStatus>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: status.model_loaded(),
        using_mock_model: status.is_stand_in(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::stand_in::StandInClassifier;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use shared::{Assessment, PredictionResponse};
    use std::sync::Arc;

    const BOUNDARY: &str = "----testboundary42";

    fn multipart_body(field_name: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
        let disposition = match filename {
            Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field_name, name),
            None => format!("form-data; name=\"{}\"", field_name),
        };

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: {}\r\n\r\n", disposition).as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_fn(32, 32, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 8) as u8, 64])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    macro_rules! stand_in_app {
        ($static_dir:expr) => {{
            let classifier: Arc<dyn Classifier> = Arc::new(StandInClassifier::seeded(7));
            test::init_service(
                App::new()
                    .app_data(web::Data::from(classifier))
                    .app_data(web::Data::new(ModelStatus::StandIn))
                    .configure(|cfg| {
                        configure_routes(cfg, $static_dir.path().to_string_lossy().into_owned())
                    }),
            )
            .await
        }};
    }

    fn post_predict(body: Vec<u8>) -> actix_web::test::TestRequest {
        test::TestRequest::post()
            .uri("/api/predict")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn predict_without_image_field_is_rejected() {
        let static_dir = tempfile::tempdir().unwrap();
        let app = stand_in_app!(static_dir);

        let body = multipart_body("metadata", Some("notes.txt"), b"not the image field");
        let resp = test::call_service(&app, post_predict(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["error"], "No image uploaded");
    }

    #[actix_web::test]
    async fn predict_with_blank_filename_is_rejected() {
        let static_dir = tempfile::tempdir().unwrap();
        let app = stand_in_app!(static_dir);

        let body = multipart_body("image", Some(""), b"");
        let resp = test::call_service(&app, post_predict(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["error"], "No file selected");
    }

    #[actix_web::test]
    async fn predict_with_wrong_extension_is_rejected() {
        let static_dir = tempfile::tempdir().unwrap();
        let app = stand_in_app!(static_dir);

        let body = multipart_body("image", Some("scan.gif"), &png_bytes());
        let resp = test::call_service(&app, post_predict(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            json["error"],
            "File type not supported. Please upload a PNG or JPEG image"
        );
    }

    #[actix_web::test]
    async fn predict_returns_a_full_assessment_for_a_valid_png() {
        let static_dir = tempfile::tempdir().unwrap();
        let app = stand_in_app!(static_dir);

        let body = multipart_body("image", Some("scan.png"), &png_bytes());
        let resp = test::call_service(&app, post_predict(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("x-model-mode")
                .and_then(|v| v.to_str().ok()),
            Some("stand-in")
        );

        let response: PredictionResponse = test::read_body_json(resp).await;
        assert_eq!(response.predictions.len(), 14);
        assert!(response.confidence <= 100);
        assert!(!response.description.is_empty());
        match response.primary {
            Assessment::Abnormal => assert!(!response.detected_conditions.is_empty()),
            Assessment::Normal => assert!(response.detected_conditions.is_empty()),
        }
    }

    #[actix_web::test]
    async fn predict_with_undecodable_bytes_is_a_server_error() {
        let static_dir = tempfile::tempdir().unwrap();
        let app = stand_in_app!(static_dir);

        let body = multipart_body("image", Some("scan.png"), b"junk that is not an image");
        let resp = test::call_service(&app, post_predict(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert!(json["error"].is_string());
    }

    #[actix_web::test]
    async fn health_reports_the_stand_in() {
        let static_dir = tempfile::tempdir().unwrap();
        let app = stand_in_app!(static_dir);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model_loaded"], false);
        assert_eq!(json["using_mock_model"], true);
    }

    #[actix_web::test]
    async fn health_and_predictions_reflect_loaded_weights() {
        let static_dir = tempfile::tempdir().unwrap();
        let classifier: Arc<dyn Classifier> = Arc::new(StandInClassifier::seeded(7));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(classifier))
                .app_data(web::Data::new(ModelStatus::Loaded {
                    strategy: "declared-shape",
                }))
                .configure(|cfg| {
                    configure_routes(cfg, static_dir.path().to_string_lossy().into_owned())
                }),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["model_loaded"], true);
        assert_eq!(json["using_mock_model"], false);

        // Only stand-in predictions carry the mode header.
        let body = multipart_body("image", Some("scan.png"), &png_bytes());
        let resp = test::call_service(&app, post_predict(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("x-model-mode").is_none());
    }
}
