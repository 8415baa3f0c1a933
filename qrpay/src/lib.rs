pub mod backend;
pub mod error;
pub mod payment;

pub use error::{ConfigError, EncodingError, GeneratorError, ValidationError};
