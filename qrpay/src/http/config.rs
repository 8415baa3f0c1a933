use envconfig::Envconfig;
use qrpay::{ConfigError, backend::BackendConfig, payment::PaymentConfig};

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: log::Level,

    #[envconfig(from = "SERVER_PORT", default = "3000")]
    pub server_port: u16,

    #[envconfig(from = "SERVER_HOST", default = "0.0.0.0")]
    pub server_host: String,

    #[envconfig(from = "CORS_ALLOW_ORIGIN", default = "*")]
    pub cors_allow_origin: String,

    #[envconfig(nested)]
    pub backend: BackendConfig,

    #[envconfig(nested)]
    pub payment: PaymentConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::init_from_env()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.payment.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&env)?.validated()
    }

    #[test]
    fn defaults_load() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.log_level, log::Level::Info);
        assert_eq!(config.payment.amount.to_string(), "15");
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = load(&[("PAYMENT_AMOUNT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unparsable_amount_is_an_env_error() {
        let err = load(&[("PAYMENT_AMOUNT", "abc")]).unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)));
    }
}
