//! Payment code encoding and rendering.
//!
//! The generator only assembles a [`PaymentDescriptor`]; turning it into a
//! scannable artifact is delegated to an [`Encoder`].

use base64::{Engine, prelude::BASE64_STANDARD};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::fmt::Debug;
use std::io::Cursor;
use url::{Url, form_urlencoded};

use crate::error::EncodingError;
use crate::payment::request::PaymentDescriptor;

// Image data source prefix; the base64 PNG is appended after a comma.
const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64";

pub const SOLANA_PAY_SCHEME: &str = "solana";

/// Encode/render collaborator.
pub trait Encoder: Debug + Send + Sync {
    fn encode_and_render(&self, descriptor: &PaymentDescriptor) -> Result<Artifact, EncodingError>;
}

/// A rendered payment code plus the payload it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    payload: String,
    png: Vec<u8>,
}

impl Artifact {
    pub fn new(payload: impl Into<String>, png: Vec<u8>) -> Self {
        Self {
            payload: payload.into(),
            png,
        }
    }

    /// Raw encoded request, for the copy action.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// PNG bytes, for the download action.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Inline image source for the display surface.
    pub fn data_url(&self) -> String {
        format!(
            "{},{}",
            PNG_DATA_URL_PREFIX,
            BASE64_STANDARD.encode(&self.png)
        )
    }
}

/// Builds a Solana Pay transfer request URL and renders it as a QR code.
#[derive(Debug, Clone, Copy)]
pub struct SolanaPayEncoder {
    min_size: u32,
}

impl Default for SolanaPayEncoder {
    fn default() -> Self {
        Self { min_size: 300 }
    }
}

impl SolanaPayEncoder {
    /// `solana:<recipient>?amount=..&spl-token=..&reference=..&label=..&message=..&memo=..`
    pub fn encode_url(descriptor: &PaymentDescriptor) -> Result<Url, EncodingError> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("amount", &descriptor.amount.to_string());
        if let Some(mint) = &descriptor.spl_token {
            query.append_pair("spl-token", mint);
        }
        query.append_pair("reference", &descriptor.reference);
        for (key, value) in [
            ("label", &descriptor.label),
            ("message", &descriptor.message),
            ("memo", &descriptor.memo),
        ] {
            if !value.is_empty() {
                query.append_pair(key, value);
            }
        }
        let raw = format!(
            "{}:{}?{}",
            SOLANA_PAY_SCHEME,
            descriptor.recipient,
            query.finish()
        );
        Ok(Url::parse(&raw)?)
    }

    fn render_png(&self, payload: &str) -> Result<Vec<u8>, EncodingError> {
        let code = QrCode::new(payload.as_bytes())?;
        let buffer = code
            .render::<Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(buffer).write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }
}

impl Encoder for SolanaPayEncoder {
    fn encode_and_render(&self, descriptor: &PaymentDescriptor) -> Result<Artifact, EncodingError> {
        if descriptor.recipient.is_empty() {
            return Err(EncodingError::Other("descriptor has no recipient".into()));
        }
        let url = Self::encode_url(descriptor)?;
        let payload = url.to_string();
        let png = self.render_png(&payload)?;
        Ok(Artifact::new(payload, png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::request::Amount;

    fn descriptor() -> PaymentDescriptor {
        PaymentDescriptor {
            recipient: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".into(),
            amount: "15".parse::<Amount>().unwrap(),
            spl_token: Some("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".into()),
            reference: "pizza-0000abcd0123456789abcdef".into(),
            label: "Slice House".into(),
            message: "Pizza order payment - $15 USDC".into(),
            memo: "Pizza payment - Slice House".into(),
        }
    }

    #[test]
    fn url_carries_all_fields_in_order() {
        let url = SolanaPayEncoder::encode_url(&descriptor()).unwrap();
        assert_eq!(url.scheme(), "solana");
        assert_eq!(url.path(), "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            ["amount", "spl-token", "reference", "label", "message", "memo"]
        );
        let memo = url
            .query_pairs()
            .find(|(k, _)| k == "memo")
            .map(|(_, v)| v.into_owned());
        assert_eq!(memo.as_deref(), Some("Pizza payment - Slice House"));
    }

    #[test]
    fn native_transfer_omits_spl_token() {
        let mut descriptor = descriptor();
        descriptor.spl_token = None;
        let url = SolanaPayEncoder::encode_url(&descriptor).unwrap();
        assert!(url.query_pairs().all(|(k, _)| k != "spl-token"));
    }

    #[test]
    fn renders_png_artifact() {
        let artifact = SolanaPayEncoder::default()
            .encode_and_render(&descriptor())
            .unwrap();
        assert!(artifact.payload().starts_with("solana:"));
        assert_eq!(&artifact.png()[..4], b"\x89PNG");
        assert!(artifact.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn empty_recipient_is_an_encoding_error() {
        let mut descriptor = descriptor();
        descriptor.recipient.clear();
        assert!(SolanaPayEncoder::default().encode_and_render(&descriptor).is_err());
    }
}
