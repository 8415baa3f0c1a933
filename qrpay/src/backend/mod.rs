use log::info;

mod client;
mod config;
mod model;

pub use client::{BackendClient, BackendClientError};
pub use config::BackendConfig;
pub use model::{Business, BusinessProfile, BusinessWallet, PaymentStatus, WALLET_NOT_LINKED};

use crate::payment::BusinessContext;

/// Loads the business whose wallet receives payments.
///
/// Authenticated dashboards read their own profile; otherwise the public
/// business info endpoint is used with the configured business id.
pub async fn load_business(
    client: &BackendClient,
    business_id: Option<&str>,
) -> Result<Option<Business>, BackendClientError> {
    if client.has_token() {
        let profile = client.business_profile().await?;
        return Ok(Some(profile.business));
    }
    match business_id {
        Some(id) => client.business_info(id).await.map(Some),
        None => Ok(None),
    }
}

pub async fn load_business_context(
    client: &BackendClient,
    business_id: Option<&str>,
) -> Result<BusinessContext, BackendClientError> {
    let business = load_business(client, business_id).await?;
    let context = business
        .as_ref()
        .map(BusinessContext::from)
        .unwrap_or_default();
    info!(
        "Loaded business context: name={:?} wallet_linked={}",
        context.name,
        context.recipient.is_some()
    );
    Ok(context)
}
