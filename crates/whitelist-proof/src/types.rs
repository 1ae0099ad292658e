//! Whitelist Primitive Types
//!
//! Addresses, hashes and the error taxonomy shared by the tree, the loader
//! and the sale gating logic.

pub use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// A 32-byte Keccak-256 digest (leaf, inner node or root).
pub type Hash = B256;

/// Number of hex characters in an address without the `0x` prefix.
const ADDRESS_HEX_LEN: usize = 40;

/// Errors produced by whitelist construction and proof queries.
///
/// All of them are ordinary outcomes: `NotFound` in particular means
/// "not whitelisted" and is expected during a presale.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WhitelistError {
    #[error("Whitelist is empty")]
    EmptyInput,

    #[error("Address {0} is not whitelisted")]
    NotFound(Address),

    #[error("Malformed address {input:?}: {reason}")]
    MalformedAddress { input: String, reason: String },
}

impl WhitelistError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parses an account address from a hex string.
///
/// Accepts input with or without the `0x` prefix, in any letter case. The
/// zero address is rejected since no wallet can mint from it.
///
/// # Errors
/// Returns `MalformedAddress` if the input is not 40 hex characters or is the
/// zero address.
pub fn parse_address(input: &str) -> Result<Address, WhitelistError> {
    let trimmed = input.trim();
    let cleaned = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if cleaned.len() != ADDRESS_HEX_LEN {
        return Err(WhitelistError::malformed(
            input,
            format!(
                "expected {ADDRESS_HEX_LEN} hex chars, got {}",
                cleaned.len()
            ),
        ));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut bytes)
        .map_err(|e| WhitelistError::malformed(input, format!("invalid hex: {e}")))?;

    let address = Address::from(bytes);
    if address.is_zero() {
        return Err(WhitelistError::malformed(input, "zero address not allowed"));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_prefix() {
        let addr = parse_address("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        assert_eq!(addr.as_slice()[0], 0x12);
        assert_eq!(addr.as_slice()[19], 0x78);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let with = parse_address("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        let without = parse_address("1234567890abcdef1234567890abcdef12345678").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_parse_address_case_insensitive() {
        let lower = parse_address("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();
        let upper = parse_address("0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_address_trims_whitespace() {
        assert!(parse_address("  0x1234567890abcdef1234567890abcdef12345678\n").is_ok());
    }

    #[test]
    fn test_parse_address_invalid_length() {
        let err = parse_address("0x1234").unwrap_err();
        assert!(matches!(err, WhitelistError::MalformedAddress { .. }));
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        let err = parse_address("0xzz34567890abcdef1234567890abcdef12345678").unwrap_err();
        assert!(matches!(err, WhitelistError::MalformedAddress { .. }));
    }

    #[test]
    fn test_parse_address_zero() {
        let err = parse_address("0x0000000000000000000000000000000000000000").unwrap_err();
        assert!(err.to_string().contains("zero address"));
    }
}
