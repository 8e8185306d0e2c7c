use alloy_primitives::{B256, hex};
use std::str::FromStr;

/// A wrapper around [`B256`] that serializes as bare lowercase hex (no `0x` prefix),
/// which is how the chain-sync protocol encodes block and transaction ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HexHash(pub B256);

impl serde::Serialize for HexHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> serde::Deserialize<'de> for HexHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        B256::from_str(&raw).map(Self).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for HexHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<HexHash> for B256 {
    fn from(value: HexHash) -> Self {
        value.0
    }
}

impl From<B256> for HexHash {
    fn from(value: B256) -> Self {
        Self(value)
    }
}
