use async_trait::async_trait;
use std::fmt::Debug;

mod address;
mod config;
mod encoder;
mod generator;
mod request;
mod schedule;
mod session;
mod share;

pub use address::{AddressValidator, BasicAddressValidator, SolanaAddressValidator, validator_for};
pub use config::{PaymentConfig, USDC_MINT};
pub use encoder::{Artifact, Encoder, SOLANA_PAY_SCHEME, SolanaPayEncoder};
pub use generator::PaymentRequestGenerator;
pub use request::{
    Amount, BusinessContext, DEFAULT_LABEL, MAX_TEXT_LEN, ParseAmountError, PaymentDescriptor,
    PaymentRequest, Reference, RequestInput,
};
pub use schedule::{IntervalScheduler, PollHandle, Scheduler, StepScheduler};
pub use session::{Session, SessionState, SessionView};
pub use share::{SHARE_TITLE, SharePayload, download_file_name};

use crate::backend::{BackendClientError, PaymentStatus};

/// Single idempotent read of a payment's status, keyed by reference.
#[async_trait]
pub trait StatusSource: Debug + Send + Sync {
    async fn fetch_status(&self, reference: &str) -> Result<PaymentStatus, BackendClientError>;
}
