use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod backend;
mod model;
mod search;
mod service;

use backend::{InferenceAdapter, RemoteBackend};
use model::Config;
use search::TavilySearchClient;
use service::{EvidenceClassifier, FactCheckService, QuestionDecomposer};

const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    // The remote backend is the path of record; a missing credential is a
    // startup error, surfaced before any call is attempted
    let api_key = std::env::var(ENV_OPENAI_API_KEY)
        .expect("OPENAI_API_KEY must be set (the remote backend is required)");
    let remote = RemoteBackend::new(&api_key).expect("Failed to create remote inference backend");

    let adapter = Arc::new(InferenceAdapter::new(
        remote,
        config.model_dir.clone(),
        &config.backend,
    ));

    let search_client = Arc::new(TavilySearchClient::from_env(&config.search));

    let decomposer = Arc::new(QuestionDecomposer::new(Arc::clone(&adapter)));
    let classifier = Arc::new(EvidenceClassifier::new(adapter, search_client));

    let fact_check_service = web::Data::new(FactCheckService::new(
        decomposer,
        classifier,
        config.limits.clone(),
    ));
    let config_data = web::Data::new(config);

    tracing::info!("Starting verifact server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(fact_check_service.clone())
            .app_data(config_data.clone())
            .configure(api::check::configure)
            .configure(api::health::configure)
            .configure(api::openapi::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
