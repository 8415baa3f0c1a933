use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::backend::Business;
use crate::error::ValidationError;
use crate::payment::config::PaymentConfig;

pub const DEFAULT_LABEL: &str = "Pizza Platform";
pub const DEFAULT_BUSINESS_NAME: &str = "Business";
pub const MAX_TEXT_LEN: usize = 200;

/// Fixed-point decimal amount, kept normalized (no trailing fractional zeros).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    units: u64,
    scale: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount {0:?}")]
pub struct ParseAmountError(String);

impl Amount {
    pub fn whole(value: u64) -> Self {
        Self {
            units: value,
            scale: 0,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    fn normalized(mut units: u64, mut scale: u32) -> Self {
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        Self { units, scale }
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || ParseAmountError(raw.to_string());
        let trimmed = raw.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(err());
        }
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) || fraction.len() > 18 {
            return Err(err());
        }
        let digits = format!("{whole}{fraction}");
        let units = digits.parse::<u64>().map_err(|_| err())?;
        Ok(Self::normalized(units, fraction.len() as u32))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }
        let divisor = 10u64.pow(self.scale);
        write!(
            f,
            "{}.{:0width$}",
            self.units / divisor,
            self.units % divisor,
            width = self.scale as usize
        )
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Opaque per-request identifier used to look up the payment status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// `{prefix}-{8 hex of the millisecond clock}{16 random hex}`.
    pub fn generate(prefix: &str, now: DateTime<Utc>) -> Self {
        let clock = now.timestamp_millis() as u64 & 0xffff_ffff;
        let suffix: u64 = rand::thread_rng().r#gen();
        Self(format!("{prefix}-{clock:08x}{suffix:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display next to the code.
    pub fn short(&self) -> &str {
        self.0.get(..16).unwrap_or(&self.0)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User intent behind a "generate payment code" action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInput {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

impl RequestInput {
    pub fn for_recipient(recipient: impl Into<String>) -> Self {
        Self {
            recipient: Some(recipient.into()),
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Business details that label the request and supply its default recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContext {
    pub name: Option<String>,
    pub recipient: Option<String>,
}

impl From<&Business> for BusinessContext {
    fn from(business: &Business) -> Self {
        Self {
            name: business
                .business_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            recipient: business.recipient().map(str::to_string),
        }
    }
}

impl BusinessContext {
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| DEFAULT_LABEL.to_string())
    }

    pub fn default_memo(&self) -> String {
        format!(
            "Pizza payment - {}",
            self.name.as_deref().unwrap_or(DEFAULT_BUSINESS_NAME)
        )
    }
}

/// Immutable payment request shown to the payer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub recipient_address: String,
    pub amount: Amount,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spl_token: Option<String>,
    pub reference: Reference,
    pub label: String,
    pub message: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Fields handed to the encode/render collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDescriptor {
    pub recipient: String,
    pub amount: Amount,
    pub spl_token: Option<String>,
    pub reference: String,
    pub label: String,
    pub message: String,
    pub memo: String,
}

impl PaymentRequest {
    /// Assembles a request for an already validated recipient.
    pub fn assemble(
        recipient: String,
        memo: Option<&str>,
        context: &BusinessContext,
        config: &PaymentConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let memo = memo
            .map(str::trim)
            .filter(|memo| !memo.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| context.default_memo());
        let label = context.label();
        check_len("memo", &memo)?;
        check_len("label", &label)?;

        Ok(Self {
            recipient_address: recipient,
            amount: config.amount,
            currency: config.currency.clone(),
            spl_token: config.spl_token().map(str::to_string),
            reference: Reference::generate(&config.reference_prefix, now),
            message: format!("Pizza order payment - ${} {}", config.amount, config.currency),
            label,
            memo,
            created_at: now,
            expires_at: now + config.expiry(),
        })
    }

    pub fn descriptor(&self) -> PaymentDescriptor {
        PaymentDescriptor {
            recipient: self.recipient_address.clone(),
            amount: self.amount,
            spl_token: self.spl_token.clone(),
            reference: self.reference.to_string(),
            label: self.label.clone(),
            message: self.message.clone(),
            memo: self.memo.clone(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn check_len(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            len,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn amount_parsing_normalizes() {
        assert_eq!("15".parse::<Amount>().unwrap().to_string(), "15");
        assert_eq!("15.50".parse::<Amount>().unwrap().to_string(), "15.5");
        assert_eq!("0.05".parse::<Amount>().unwrap().to_string(), "0.05");
        assert_eq!("15.000".parse::<Amount>().unwrap(), Amount::whole(15));
        assert!("".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
    }

    #[test]
    fn references_are_unique_and_prefixed() {
        let now = Utc::now();
        let refs: HashSet<_> = (0..10_000)
            .map(|_| Reference::generate("pizza", now))
            .collect();
        assert_eq!(refs.len(), 10_000);
        let sample = refs.iter().next().unwrap();
        assert!(sample.as_str().starts_with("pizza-"));
        assert_eq!(sample.as_str().len(), "pizza-".len() + 24);
        assert_eq!(sample.short().len(), 16);
    }

    #[test]
    fn assemble_uses_business_defaults() {
        let context = BusinessContext {
            name: Some("Slice House".into()),
            recipient: None,
        };
        let now = Utc::now();
        let config = PaymentConfig::default();
        let request =
            PaymentRequest::assemble("Recipient".into(), None, &context, &config, now).unwrap();
        assert_eq!(request.label, "Slice House");
        assert_eq!(request.memo, "Pizza payment - Slice House");
        assert_eq!(request.message, "Pizza order payment - $15 USDC");
        assert_eq!(request.expires_at - request.created_at, config.expiry());

        let anonymous = PaymentRequest::assemble(
            "Recipient".into(),
            Some("  "),
            &BusinessContext::default(),
            &config,
            now,
        )
        .unwrap();
        assert_eq!(anonymous.label, DEFAULT_LABEL);
        assert_eq!(anonymous.memo, "Pizza payment - Business");
    }

    #[test]
    fn assemble_rejects_oversized_memo() {
        let memo = "x".repeat(MAX_TEXT_LEN + 1);
        let err = PaymentRequest::assemble(
            "Recipient".into(),
            Some(&memo),
            &BusinessContext::default(),
            &PaymentConfig::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "memo", .. }));
    }
}
