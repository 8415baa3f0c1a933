use async_trait::async_trait;
use http::StatusCode;
use log::debug;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::backend::config::BackendConfig;
use crate::backend::model::{Business, BusinessProfile, PaymentStatus};
use crate::payment::StatusSource;

/// A client for the platform's REST backend.
///
/// Covers the business lookups that feed the payment label and recipient,
/// and the per-reference payment status endpoint polled by the generator.
#[derive(Clone, Debug)]
pub struct BackendClient {
    /// Base URL of the backend (e.g. `https://api.example/`)
    base_url: Url,
    /// Full URL to `GET /business/profile` requests
    profile_url: Url,
    /// Business token sent as `Authorization: Bearer`
    bearer_token: Option<String>,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional request timeout
    timeout: Option<Duration>,
}

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl BackendClient {
    /// Constructs a new [`BackendClient`] from a base URL.
    pub fn try_new(base_url: Url) -> Result<Self, BackendClientError> {
        let profile_url =
            base_url
                .join("./business/profile")
                .map_err(|e| BackendClientError::UrlParse {
                    context: "Failed to construct ./business/profile URL",
                    source: e,
                })?;
        Ok(Self {
            client: Client::new(),
            base_url,
            profile_url,
            bearer_token: None,
            timeout: None,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendClientError> {
        let mut client = Self::try_new(config.api_base.clone())?;
        if let Some(token) = config.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            client = client.with_bearer_token(token);
        }
        if config.timeout_ms > 0 {
            client = client.with_timeout(Duration::from_millis(config.timeout_ms));
        }
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Authenticates all future requests with the given business token.
    pub fn with_bearer_token(&self, token: impl Into<String>) -> Self {
        let mut this = self.clone();
        this.bearer_token = Some(token.into());
        this
    }

    /// Sets a timeout for all future requests.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Sends a `GET /blockchain/payment/status/{reference}` request.
    pub async fn payment_status(
        &self,
        reference: &str,
    ) -> Result<PaymentStatus, BackendClientError> {
        let url = self.join_segments(
            &["blockchain", "payment", "status", reference],
            "Failed to construct payment status URL",
        )?;
        self.get_json(&url, "GET /blockchain/payment/status").await
    }

    /// Sends an authenticated `GET /business/profile` request.
    pub async fn business_profile(&self) -> Result<BusinessProfile, BackendClientError> {
        self.get_json(&self.profile_url, "GET /business/profile")
            .await
    }

    /// Sends a public `GET /business/info/{id}` request.
    pub async fn business_info(&self, business_id: &str) -> Result<Business, BackendClientError> {
        let url = self.join_segments(
            &["business", "info", business_id],
            "Failed to construct business info URL",
        )?;
        self.get_json(&url, "GET /business/info").await
    }

    /// Appends percent-encoded path segments to the base URL.
    fn join_segments(
        &self,
        segments: &[&str],
        context: &'static str,
    ) -> Result<Url, BackendClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendClientError::UrlParse {
                context,
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Generic GET helper that handles authentication, error mapping and
    /// timeout application.
    ///
    /// `context` is a human-readable identifier used in logs and error
    /// messages (e.g. `"GET /business/profile"`).
    async fn get_json<R>(&self, url: &Url, context: &'static str) -> Result<R, BackendClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        debug!("{} -> {}", context, url);
        let mut req = self.client.get(url.clone());
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| BackendClientError::Http { context, source: e })?;

        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| BackendClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| BackendClientError::ResponseBodyRead { context, source: e })?;
            Err(BackendClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

#[async_trait]
impl StatusSource for BackendClient {
    async fn fetch_status(&self, reference: &str) -> Result<PaymentStatus, BackendClientError> {
        self.payment_status(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_url_is_joined_under_base_path() {
        let client =
            BackendClient::try_new(Url::parse("https://api.example/v1/").unwrap()).unwrap();
        let url = client
            .join_segments(&["blockchain", "payment", "status", "pizza-1 2"], "test")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example/v1/blockchain/payment/status/pizza-1%202"
        );
        assert_eq!(
            client.profile_url.as_str(),
            "https://api.example/v1/business/profile"
        );
    }

    #[test]
    fn empty_token_is_ignored() {
        let config = BackendConfig {
            api_base: Url::parse("http://localhost:7000/").unwrap(),
            bearer_token: Some(String::new()),
            business_id: None,
            timeout_ms: 0,
        };
        let client = BackendClient::from_config(&config).unwrap();
        assert!(!client.has_token());
        assert!(client.timeout.is_none());
    }
}
