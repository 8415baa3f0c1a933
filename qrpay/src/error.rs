use thiserror::Error;

pub use crate::backend::BackendClientError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipient wallet address is missing; link a wallet in Settings first")]
    MissingRecipient,

    #[error("Invalid recipient wallet address: {0}")]
    MalformedRecipient(String),

    #[error("{field} is too long: {len} characters (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to assemble payment URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to build QR code: {0}")]
    QrCode(#[from] qrcode::types::QrError),

    #[error("Failed to export QR image: {0}")]
    Image(#[from] image::ImageError),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Env(#[from] envconfig::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl GeneratorError {
    pub fn is_validation(&self) -> bool {
        matches!(self, GeneratorError::Validation(_))
    }
}
