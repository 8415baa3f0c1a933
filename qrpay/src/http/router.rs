use crate::http::payment;
use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, Method},
    routing::get,
};
use log::warn;
use qrpay::{backend::BackendClient, payment::PaymentRequestGenerator};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<PaymentRequestGenerator>,
    pub backend: Arc<BackendClient>,
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentRequestGenerator> {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}

impl FromRef<AppState> for Arc<BackendClient> {
    fn from_ref(state: &AppState) -> Self {
        state.backend.clone()
    }
}

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origin = if allow_origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(allow_origin) {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", allow_origin, e);
                AllowOrigin::any()
            }
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allow_origin);
    Router::new()
        .route("/payment/readiness", get(payment::handle_readiness))
        .route(
            "/payment/request",
            get(payment::handle_current)
                .post(payment::handle_create)
                .delete(payment::handle_cancel),
        )
        .route("/payment/request/qr.png", get(payment::handle_download))
        .route("/payment/request/share", get(payment::handle_share))
        .route("/payment/request/payload", get(payment::handle_payload))
        .layer(cors)
        .with_state(state)
}
