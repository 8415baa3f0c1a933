use envconfig::Envconfig;
use std::time::Duration;

use crate::error::ConfigError;
use crate::payment::request::Amount;

/// USDC mint on Solana mainnet.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

const MAX_EXPIRY_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Envconfig, Debug, Clone)]
pub struct PaymentConfig {
    #[envconfig(from = "PAYMENT_AMOUNT", default = "15")]
    pub amount: Amount,

    #[envconfig(from = "PAYMENT_CURRENCY", default = "USDC")]
    pub currency: String,

    // Empty means a native SOL transfer.
    #[envconfig(
        from = "PAYMENT_SPL_TOKEN",
        default = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
    )]
    pub spl_token: String,

    #[envconfig(from = "PAYMENT_TOKEN_DECIMALS", default = "6")]
    pub token_decimals: u32,

    #[envconfig(from = "PAYMENT_REFERENCE_PREFIX", default = "pizza")]
    pub reference_prefix: String,

    #[envconfig(from = "PAYMENT_POLL_INTERVAL_MS", default = "3000")]
    pub poll_interval_ms: u64,

    #[envconfig(from = "PAYMENT_EXPIRY_SECS", default = "900")]
    pub expiry_secs: u64,

    #[envconfig(from = "PAYMENT_ENFORCE_EXPIRY", default = "false")]
    pub enforce_expiry: bool,

    #[envconfig(from = "PAYMENT_STRICT_ADDRESS", default = "true")]
    pub strict_address: bool,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            amount: Amount::whole(15),
            currency: "USDC".to_string(),
            spl_token: USDC_MINT.to_string(),
            token_decimals: 6,
            reference_prefix: "pizza".to_string(),
            poll_interval_ms: 3000,
            expiry_secs: 900,
            enforce_expiry: false,
            strict_address: true,
        }
    }
}

impl PaymentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn expiry(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expiry_secs.min(MAX_EXPIRY_SECS) as i64)
    }

    pub fn spl_token(&self) -> Option<&str> {
        Some(self.spl_token.trim()).filter(|mint| !mint.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.amount.is_zero() {
            return Err(ConfigError::Invalid("PAYMENT_AMOUNT must be greater than zero".into()));
        }
        if self.amount.scale() > self.token_decimals {
            return Err(ConfigError::Invalid(format!(
                "PAYMENT_AMOUNT {} has more decimals than the token supports ({})",
                self.amount, self.token_decimals
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("PAYMENT_POLL_INTERVAL_MS must be non-zero".into()));
        }
        let prefix_ok = !self.reference_prefix.is_empty()
            && self
                .reference_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !prefix_ok {
            return Err(ConfigError::Invalid(format!(
                "PAYMENT_REFERENCE_PREFIX {:?} must be non-empty and URL safe",
                self.reference_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_defaults_match_default_impl() {
        let from_env = PaymentConfig::init_from_hashmap(&HashMap::new()).unwrap();
        let default = PaymentConfig::default();
        assert_eq!(from_env.amount, default.amount);
        assert_eq!(from_env.spl_token, default.spl_token);
        assert_eq!(from_env.poll_interval(), Duration::from_secs(3));
        assert!(!from_env.enforce_expiry);
        assert!(from_env.validate().is_ok());
    }

    #[test]
    fn rejects_amount_finer_than_token() {
        let config = PaymentConfig {
            amount: "0.0000001".parse().unwrap(),
            ..PaymentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_mint_means_native_transfer() {
        let mut vars = HashMap::new();
        vars.insert("PAYMENT_SPL_TOKEN".to_string(), String::new());
        let config = PaymentConfig::init_from_hashmap(&vars).unwrap();
        assert_eq!(config.spl_token(), None);
    }
}
