use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use log::{error, info, warn};
use qrpay::{
    GeneratorError, backend,
    payment::{RequestInput, SharePayload, download_file_name},
};

use crate::http::{
    model::{CreatedResponse, ErrorResponse, ReadinessResponse},
    router::AppState,
};

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))).into_response()
}

pub async fn handle_readiness(State(state): State<AppState>) -> Response {
    let context = match backend::load_business_context(
        &state.backend,
        state.config.backend.business_id.as_deref(),
    )
    .await
    {
        Ok(context) => context,
        Err(e) => {
            error!("Error loading payment information: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Error loading payment information")),
            )
                .into_response();
        }
    };
    let wallet_linked = context.recipient.is_some();
    if !wallet_linked {
        warn!("Business wallet not linked; payment codes cannot be generated");
    }
    let business_name = context.name.clone();
    state.generator.set_business_context(context);
    Json(ReadinessResponse::new(wallet_linked, business_name)).into_response()
}

pub async fn handle_create(
    State(state): State<AppState>,
    Json(input): Json<RequestInput>,
) -> Response {
    match state.generator.create_request(input) {
        Ok(session) => (StatusCode::CREATED, Json(CreatedResponse::from(&session))).into_response(),
        Err(e @ GeneratorError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e))).into_response()
        }
        Err(e @ GeneratorError::Encoding(_)) => {
            error!("QR generation error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("Failed to generate QR code: {}", e))),
            )
                .into_response()
        }
    }
}

pub async fn handle_cancel(State(state): State<AppState>) -> StatusCode {
    state.generator.cancel_request();
    StatusCode::NO_CONTENT
}

pub async fn handle_current(State(state): State<AppState>) -> Response {
    Json(state.generator.snapshot()).into_response()
}

pub async fn handle_download(State(state): State<AppState>) -> Response {
    let Some(artifact) = state.generator.artifact() else {
        return not_found("No QR code to download");
    };
    let file_name = download_file_name(Utc::now());
    info!("Serving payment QR download {}", file_name);
    (
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        artifact.png().to_vec(),
    )
        .into_response()
}

pub async fn handle_share(State(state): State<AppState>) -> Response {
    let Some(session) = state.generator.current() else {
        return not_found("No QR code to share");
    };
    Json(SharePayload::new(&session.request, &session.artifact)).into_response()
}

pub async fn handle_payload(State(state): State<AppState>) -> Response {
    let Some(artifact) = state.generator.artifact() else {
        return not_found("No QR code to copy");
    };
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        artifact.payload().to_string(),
    )
        .into_response()
}
