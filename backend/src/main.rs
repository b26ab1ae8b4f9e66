mod analysis;
mod classifier;
mod config;
mod error;
mod preprocess;
mod routes;
mod upload;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use classifier::LoadPolicy;
use config::AppConfig;
use routes::configure_routes;
use std::env;
use std::path::Path;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::from_env();

    if let Err(e) = config::validate_thresholds() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Threshold table is invalid: {}", e),
        ));
    }

    let policy = if config.strict_model_load {
        LoadPolicy::Strict
    } else {
        LoadPolicy::AllowStandIn
    };

    let (classifier, status) = match classifier::load(Path::new(&config.model_path), policy) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("Failed to load model at startup: {:?}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Model loading failed: {:?}", e),
            ));
        }
    };

    if status.is_stand_in() {
        log::warn!("Serving untrained stand-in predictions until model weights are provided.");
    }

    let classifier_data = web::Data::from(classifier);
    let status_data = web::Data::new(status);
    let static_dir = config.static_dir.clone();
    let cors_origin = config.cors_allowed_origin.clone();

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let cors = if cors_origin == "*" {
            Cors::default().allow_any_origin()
        } else {
            Cors::default().allowed_origin(&cors_origin)
        };
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(classifier_data.clone())
            .app_data(status_data.clone())
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
