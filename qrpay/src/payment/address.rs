use std::fmt::Debug;
use std::sync::Arc;

use crate::error::ValidationError;

/// Syntactic check applied to a recipient before any request is built.
pub trait AddressValidator: Debug + Send + Sync {
    fn validate(&self, address: &str) -> Result<(), ValidationError>;
}

/// A Solana public key: 32 to 44 base58 characters decoding to 32 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaAddressValidator;

impl AddressValidator for SolanaAddressValidator {
    fn validate(&self, address: &str) -> Result<(), ValidationError> {
        let malformed = || ValidationError::MalformedRecipient(address.to_string());
        if !(32..=44).contains(&address.len()) {
            return Err(malformed());
        }
        let bytes = bs58::decode(address).into_vec().map_err(|_| malformed())?;
        if bytes.len() != 32 {
            return Err(malformed());
        }
        Ok(())
    }
}

/// Loose check for backends that hand out non-Solana identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAddressValidator;

const BASIC_MAX_LEN: usize = 64;

impl AddressValidator for BasicAddressValidator {
    fn validate(&self, address: &str) -> Result<(), ValidationError> {
        let ok = !address.is_empty()
            && address.len() <= BASIC_MAX_LEN
            && address.chars().all(|c| c.is_ascii_alphanumeric());
        if ok {
            Ok(())
        } else {
            Err(ValidationError::MalformedRecipient(address.to_string()))
        }
    }
}

pub fn validator_for(strict: bool) -> Arc<dyn AddressValidator> {
    if strict {
        Arc::new(SolanaAddressValidator)
    } else {
        Arc::new(BasicAddressValidator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn solana_accepts_real_pubkeys() {
        assert!(SolanaAddressValidator.validate(USDC_MINT).is_ok());
        assert!(
            SolanaAddressValidator
                .validate("11111111111111111111111111111111")
                .is_ok()
        );
    }

    #[test]
    fn solana_rejects_bad_alphabet_and_length() {
        // '0', 'O', 'I' and 'l' are outside the base58 alphabet
        assert!(
            SolanaAddressValidator
                .validate("0PjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v")
                .is_err()
        );
        assert!(SolanaAddressValidator.validate("ValidAddr123").is_err());
        assert!(SolanaAddressValidator.validate("").is_err());
        assert!(SolanaAddressValidator.validate(&"z".repeat(44)).is_err());
    }

    #[test]
    fn basic_accepts_alphanumeric() {
        assert!(BasicAddressValidator.validate("ValidAddr123").is_ok());
        assert!(BasicAddressValidator.validate("bad addr").is_err());
        assert!(BasicAddressValidator.validate("addr!").is_err());
        assert!(BasicAddressValidator.validate(&"a".repeat(65)).is_err());
    }
}
