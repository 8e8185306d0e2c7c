//! Inputs and outputs of the storage traits that are not chain facts themselves.

use crate::StorageError;
use alloy_primitives::hex;
use derive_more::Constructor;
use utxodex_types::UtxoId;

/// Options for a single batch commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// When set, outputs spent strictly before this slot are deleted in the same
    /// transaction. `None` skips pruning.
    pub prune_spent_before: Option<u64>,
}

/// Rows actually written by a batch commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Blocks inserted.
    pub blocks: usize,
    /// Transactions inserted.
    pub transactions: usize,
    /// Addresses seen for the first time.
    pub new_addresses: usize,
    /// Outputs inserted.
    pub outputs: usize,
    /// Outputs whose spend slot was set.
    pub spent_outputs: usize,
    /// Spent outputs deleted by pruning.
    pub pruned_outputs: usize,
}

/// Rows affected by a rollback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackStats {
    /// Blocks deleted.
    pub blocks: usize,
    /// Transactions deleted.
    pub transactions: usize,
    /// Addresses deleted.
    pub addresses: usize,
    /// Outputs deleted.
    pub outputs: usize,
    /// Outputs marked unspent again.
    pub unspent_outputs: usize,
}

/// A native asset selector used by [`UtxoQuery::has_one_of_tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct AssetId {
    /// Hex encoded minting policy id.
    pub policy_id: String,
    /// Hex encoded asset name, possibly empty.
    pub asset_name: String,
}

impl AssetId {
    /// JSON path of this asset's quantity inside a stored output payload.
    pub(crate) fn json_path(&self) -> Result<String, StorageError> {
        let is_hex = |s: &str| s.len() % 2 == 0 && hex::decode(s).is_ok();
        if self.policy_id.is_empty() || !is_hex(&self.policy_id) || !is_hex(&self.asset_name) {
            return Err(StorageError::InvalidTokenFilter(format!(
                "{}.{}",
                self.policy_id, self.asset_name
            )));
        }
        Ok(format!("$.value.\"{}\".\"{}\"", self.policy_id, self.asset_name))
    }
}

/// Filters and pagination applied to unspent-output lookups.
///
/// Results are always restricted to unspent outputs and ordered by utxo id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoQuery {
    /// Maximum number of rows returned.
    pub limit: Option<u32>,
    /// Only return outputs whose id sorts after this one.
    pub after: Option<UtxoId>,
    /// Only return outputs carrying a datum.
    pub must_have_datum: bool,
    /// Only return outputs holding at least one of these assets. Empty means no filter.
    pub has_one_of_tokens: Vec<AssetId>,
    /// Join the producing transaction to report its position in the block.
    pub include_tx_index: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_json_path() {
        let asset = AssetId::new("abcd".to_string(), "".to_string());
        assert_eq!(asset.json_path().unwrap(), "$.value.\"abcd\".\"\"");
    }

    #[test]
    fn test_asset_json_path_rejects_non_hex() {
        let asset = AssetId::new("ab\"cd".to_string(), "00".to_string());
        assert!(matches!(asset.json_path(), Err(StorageError::InvalidTokenFilter(_))));
    }
}
