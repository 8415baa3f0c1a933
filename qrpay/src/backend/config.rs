use envconfig::Envconfig;
use url::Url;

#[derive(Envconfig, Debug, Clone)]
pub struct BackendConfig {
    #[envconfig(from = "BACKEND_API_BASE", default = "http://localhost:7000/")]
    pub api_base: Url,

    #[envconfig(from = "BACKEND_BEARER_TOKEN")]
    pub bearer_token: Option<String>,

    #[envconfig(from = "BACKEND_BUSINESS_ID")]
    pub business_id: Option<String>,

    #[envconfig(from = "BACKEND_TIMEOUT_MS", default = "10000")]
    pub timeout_ms: u64,
}
