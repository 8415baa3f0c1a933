use serde::Serialize;
use std::sync::Arc;

use crate::backend::PaymentStatus;
use crate::payment::encoder::Artifact;
use crate::payment::request::PaymentRequest;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Generating,
    Polling,
    Succeeded {
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
    },
    Failed {
        error: String,
    },
    Cancelled,
    Expired,
}

impl SessionState {
    /// Maps a completed status to its terminal state; `None` while pending.
    pub fn from_status(status: PaymentStatus) -> Option<Self> {
        if !status.completed {
            return None;
        }
        let state = if status.success {
            SessionState::Succeeded {
                signature: status.signature,
                amount: status.amount,
            }
        } else {
            SessionState::Failed {
                error: status.error.unwrap_or_else(|| "Payment failed".to_string()),
            }
        };
        Some(state)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded { .. }
                | SessionState::Failed { .. }
                | SessionState::Cancelled
                | SessionState::Expired
        )
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, SessionState::Polling)
    }
}

/// The displayed request and the artifact rendered for it.
#[derive(Debug, Clone)]
pub struct Session {
    pub request: Arc<PaymentRequest>,
    pub artifact: Arc<Artifact>,
}

/// Snapshot of the session slot published to the display surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<PaymentRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl SessionView {
    pub fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            request: None,
            payload: None,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        self.request.as_ref().map(|r| r.reference.as_str())
    }
}
