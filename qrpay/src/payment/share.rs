use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::payment::encoder::Artifact;
use crate::payment::request::PaymentRequest;

pub const SHARE_TITLE: &str = "Pizza Payment QR Code";

/// Payload for a platform share sheet, with `clipboard_text` as the fallback
/// when sharing is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
    pub clipboard_text: String,
}

impl SharePayload {
    pub fn new(request: &PaymentRequest, artifact: &Artifact) -> Self {
        let price = format!("${} {}", request.amount, request.currency);
        Self {
            title: SHARE_TITLE.to_string(),
            text: format!("Scan to pay {price} for your pizza!"),
            url: artifact.payload().to_string(),
            clipboard_text: format!("Pizza Payment: {price}\nPayment URL: {}", artifact.payload()),
        }
    }
}

pub fn download_file_name(now: DateTime<Utc>) -> String {
    format!("pizza-payment-qr-{}.png", now.timestamp_millis())
}
