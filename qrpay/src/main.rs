mod http;

use env_logger::Env;
use http::Config;
use log::{error, info, warn};
use qrpay::{
    backend::{self, BackendClient},
    payment::{PaymentRequestGenerator, SolanaPayEncoder},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Logging comes up before the full config so that config errors are visible.
    let default_filter = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(BackendClient::from_config(&config.backend)?);
    let generator = PaymentRequestGenerator::new(
        config.payment.clone(),
        backend.clone(),
        Arc::new(SolanaPayEncoder::default()),
    );

    match backend::load_business_context(&backend, config.backend.business_id.as_deref()).await {
        Ok(context) => generator.set_business_context(context),
        Err(e) => warn!(
            "Could not load business details from {}: {}; recipients must be supplied per request",
            backend.base_url(),
            e
        ),
    }

    let state = http::router::AppState {
        config: config.clone(),
        generator: Arc::new(generator),
        backend,
    };
    let app = http::router::build_router(state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on {} (log level {})", addr, config.log_level);
    info!(
        "Payment requests: {} {} every {}ms against {}",
        config.payment.amount,
        config.payment.currency,
        config.payment.poll_interval_ms,
        config.backend.api_base
    );

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
