use qrpay::payment::{PaymentRequest, Session};
use serde::Serialize;

pub const WALLET_READY: &str = "Solana Pay Ready";
pub const WALLET_NOT_LINKED: &str = "Wallet Not Linked";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub wallet_linked: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
}

impl ReadinessResponse {
    pub fn new(wallet_linked: bool, business_name: Option<String>) -> Self {
        Self {
            wallet_linked,
            status: if wallet_linked {
                WALLET_READY
            } else {
                WALLET_NOT_LINKED
            },
            business_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub request: PaymentRequest,
    pub short_reference: String,
    pub payload: String,
    pub image: String,
}

impl From<&Session> for CreatedResponse {
    fn from(session: &Session) -> Self {
        Self {
            request: (*session.request).clone(),
            short_reference: session.request.reference.short().to_string(),
            payload: session.artifact.payload().to_string(),
            image: session.artifact.data_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
