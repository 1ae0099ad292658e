//! Whitelist Loading
//!
//! The whitelist is static configuration: a JSON array of hex address
//! strings, loaded once at startup.

use crate::tree::WhitelistTree;
use crate::types::{parse_address, Address, WhitelistError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from reading a whitelist file.
#[derive(Error, Debug)]
pub enum WhitelistLoadError {
    #[error("Failed to read whitelist {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Whitelist is not a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Whitelist entry {index}: {source}")]
    Entry {
        index: usize,
        source: WhitelistError,
    },
}

/// An ordered list of whitelisted addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    addresses: Vec<Address>,
}

impl Whitelist {
    /// Wrap already-parsed addresses.
    #[must_use]
    pub fn new(addresses: Vec<Address>) -> Self {
        Self { addresses }
    }

    /// Parse every entry as an address, keeping order and duplicates.
    ///
    /// # Errors
    /// Fails on the first malformed entry, reporting its index.
    pub fn parse<I, S>(entries: I) -> Result<Self, WhitelistLoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                parse_address(entry.as_ref())
                    .map_err(|source| WhitelistLoadError::Entry { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { addresses })
    }

    /// Parse a JSON array of address strings.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or any entry is not an address.
    pub fn from_json_str(json: &str) -> Result<Self, WhitelistLoadError> {
        let entries: Vec<String> = serde_json::from_str(json)?;
        Self::parse(entries)
    }

    /// Read and parse a whitelist JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    #[instrument]
    pub fn from_json_file(path: &Path) -> Result<Self, WhitelistLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| WhitelistLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let whitelist = Self::from_json_str(&json)?;
        debug!(entries = whitelist.len(), "Loaded whitelist");
        Ok(whitelist)
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Byte-level membership check, so letter case of the source hex is irrelevant.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Build the Merkle tree over this whitelist.
    ///
    /// # Errors
    /// Returns `EmptyInput` for an empty whitelist.
    pub fn build_tree(&self) -> Result<WhitelistTree, WhitelistError> {
        WhitelistTree::build(&self.addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ALICE: &str = "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4";
    const BOB: &str = "0xAb8483F64d9C6d1EcF9b849Ae677dD3315835cb2";

    #[test]
    fn test_from_json_str() {
        let json = format!(r#"["{ALICE}", "{BOB}"]"#);
        let whitelist = Whitelist::from_json_str(&json).unwrap();
        assert_eq!(whitelist.len(), 2);
        assert!(whitelist.contains(&parse_address(BOB).unwrap()));
    }

    #[test]
    fn test_contains_ignores_case() {
        let whitelist = Whitelist::parse([ALICE]).unwrap();
        let lower = parse_address(&ALICE.to_lowercase()).unwrap();
        assert!(whitelist.contains(&lower));
    }

    #[test]
    fn test_malformed_entry_reports_index() {
        let err = Whitelist::parse([ALICE, "0x1234"]).unwrap_err();
        match err {
            WhitelistLoadError::Entry { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(source, WhitelistError::MalformedAddress { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_not_an_array() {
        let err = Whitelist::from_json_str(r#"{"addresses": []}"#).unwrap_err();
        assert!(matches!(err, WhitelistLoadError::Json(_)));
    }

    #[test]
    fn test_empty_list_loads_but_does_not_build() {
        let whitelist = Whitelist::from_json_str("[]").unwrap();
        assert!(whitelist.is_empty());
        assert_eq!(whitelist.build_tree(), Err(WhitelistError::EmptyInput));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["{ALICE}"]"#).unwrap();

        let whitelist = Whitelist::from_json_file(file.path()).unwrap();
        let tree = whitelist.build_tree().unwrap();
        assert!(tree.contains(&parse_address(ALICE).unwrap()));
    }

    #[test]
    fn test_missing_file() {
        let err = Whitelist::from_json_file(Path::new("/nonexistent/whitelist.json")).unwrap_err();
        assert!(matches!(err, WhitelistLoadError::Io { .. }));
    }
}
