use alloy_primitives::{B256, hex};
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a transaction output, rendered as `"<txHash>#<index>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtxoId {
    /// Hash of the producing transaction.
    pub tx_hash: B256,
    /// Position of the output within the producing transaction.
    pub index: u32,
}

impl UtxoId {
    /// Creates a new [`UtxoId`].
    pub const fn new(tx_hash: B256, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl std::fmt::Display for UtxoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", hex::encode(self.tx_hash), self.index)
    }
}

/// Errors returned when parsing a [`UtxoId`] from its text form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UtxoIdError {
    /// Either side of the `#` separator is missing.
    #[error("invalid utxo id format: {0} (expected txHash#index)")]
    InvalidFormat(String),
    /// The transaction hash is not 64 hex characters long.
    #[error("invalid utxo tx hash length: {0} (expected 64)")]
    InvalidTxHashLength(usize),
    /// The transaction hash is not valid hex.
    #[error("invalid utxo tx hash: {0}")]
    InvalidTxHash(String),
    /// The output index is not a non-negative integer.
    #[error("invalid utxo index: {0} (expected a non-negative integer)")]
    InvalidIndex(String),
}

impl FromStr for UtxoId {
    type Err = UtxoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tx_hash, index) = match s.split_once('#') {
            Some((tx_hash, index)) if !tx_hash.is_empty() && !index.is_empty() => (tx_hash, index),
            _ => return Err(UtxoIdError::InvalidFormat(s.to_string())),
        };

        if tx_hash.len() != 64 {
            return Err(UtxoIdError::InvalidTxHashLength(tx_hash.len()));
        }
        let tx_hash =
            B256::from_str(tx_hash).map_err(|_| UtxoIdError::InvalidTxHash(tx_hash.to_string()))?;
        let index = index.parse::<u32>().map_err(|_| UtxoIdError::InvalidIndex(index.to_string()))?;

        Ok(Self { tx_hash, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TX_HASH: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn test_parse_valid_utxo_id() {
        let utxo_id: UtxoId = format!("{TX_HASH}#7").parse().unwrap();
        assert_eq!(utxo_id.index, 7);
        assert_eq!(utxo_id.to_string(), format!("{TX_HASH}#7"));
    }

    #[rstest]
    #[case::missing_separator(TX_HASH.to_string(), UtxoIdError::InvalidFormat(TX_HASH.to_string()))]
    #[case::missing_index(format!("{TX_HASH}#"), UtxoIdError::InvalidFormat(format!("{TX_HASH}#")))]
    #[case::missing_hash("#0".to_string(), UtxoIdError::InvalidFormat("#0".to_string()))]
    #[case::short_hash("abcd#0".to_string(), UtxoIdError::InvalidTxHashLength(4))]
    #[case::negative_index(format!("{TX_HASH}#-1"), UtxoIdError::InvalidIndex("-1".to_string()))]
    #[case::text_index(format!("{TX_HASH}#abc"), UtxoIdError::InvalidIndex("abc".to_string()))]
    fn test_parse_invalid_utxo_id(#[case] input: String, #[case] expected: UtxoIdError) {
        assert_eq!(input.parse::<UtxoId>(), Err(expected));
    }

    #[test]
    fn test_parse_rejects_non_hex_hash() {
        let input = format!("{}#0", "z".repeat(64));
        assert!(matches!(input.parse::<UtxoId>(), Err(UtxoIdError::InvalidTxHash(_))));
    }
}
