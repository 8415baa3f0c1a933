use serde::{Deserialize, Serialize};

/// Placeholder the backend stores when a business has not linked a wallet yet.
pub const WALLET_NOT_LINKED: &str = "Not linked";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl PaymentStatus {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn succeeded(signature: impl Into<String>) -> Self {
        Self {
            completed: true,
            success: true,
            signature: Some(signature.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            completed: true,
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessWallet {
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub business_wallet: Option<BusinessWallet>,
}

impl Business {
    /// Wallet that receives payments: the managed business wallet first, then
    /// the address linked in settings.
    pub fn recipient(&self) -> Option<&str> {
        self.business_wallet
            .as_ref()
            .and_then(|wallet| wallet.public_key.as_deref())
            .or(self.wallet_address.as_deref())
            .map(str::trim)
            .filter(|addr| !addr.is_empty() && *addr != WALLET_NOT_LINKED)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub business: Business,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_fields_default_when_missing() {
        let status: PaymentStatus = serde_json::from_str(r#"{"completed":false}"#).unwrap();
        assert_eq!(status, PaymentStatus::pending());

        let status: PaymentStatus = serde_json::from_str(
            r#"{"completed":true,"success":true,"signature":"sig1","amount":15}"#,
        )
        .unwrap();
        assert!(status.completed && status.success);
        assert_eq!(status.signature.as_deref(), Some("sig1"));
        assert_eq!(status.amount, Some(15.0));
    }

    #[test]
    fn recipient_prefers_business_wallet() {
        let business: Business = serde_json::from_str(
            r#"{"businessName":"Slice","walletAddress":"linked","businessWallet":{"publicKey":"managed"}}"#,
        )
        .unwrap();
        assert_eq!(business.recipient(), Some("managed"));
    }

    #[test]
    fn not_linked_wallet_is_absent() {
        let business = Business {
            wallet_address: Some(WALLET_NOT_LINKED.to_string()),
            ..Business::default()
        };
        assert_eq!(business.recipient(), None);
    }
}
