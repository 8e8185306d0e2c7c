//! Chain points and tips as exchanged with the chain-sync event source.

use crate::HexHash;
use alloy_primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

/// The sentinel used by the event source for the start of the chain.
pub const ORIGIN: &str = "origin";

/// A concrete position on the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Slot of the block.
    pub slot: u64,
    /// Hash of the block.
    pub id: HexHash,
}

impl Point {
    /// Creates a new [`Point`].
    pub const fn new(slot: u64, id: B256) -> Self {
        Self { slot, id: HexHash(id) }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.slot)
    }
}

/// The tip of the node's chain, carried alongside every chain-sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    /// Slot of the tip block.
    pub slot: u64,
    /// Hash of the tip block.
    pub id: HexHash,
    /// Height of the tip block.
    pub height: u64,
}

/// Either the origin sentinel or a concrete [`Point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainPoint {
    /// Start of the chain.
    Origin,
    /// A block on the chain.
    At(Point),
}

impl ChainPoint {
    /// Returns the slot of this point, resolving the origin to `origin_slot`.
    pub const fn slot_or(&self, origin_slot: u64) -> u64 {
        match self {
            Self::Origin => origin_slot,
            Self::At(point) => point.slot,
        }
    }
}

impl From<Point> for ChainPoint {
    fn from(value: Point) -> Self {
        Self::At(value)
    }
}

impl std::fmt::Display for ChainPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Origin => f.write_str(ORIGIN),
            Self::At(point) => point.fmt(f),
        }
    }
}

/// Either the origin sentinel or a concrete [`Tip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTip {
    /// The node has no blocks yet.
    Origin,
    /// The node's current tip.
    At(Tip),
}

impl ChainTip {
    /// Returns the height of the tip, or `None` at origin.
    pub const fn height(&self) -> Option<u64> {
        match self {
            Self::Origin => None,
            Self::At(tip) => Some(tip.height),
        }
    }

    /// Returns the slot of the tip, or `None` at origin.
    pub const fn slot(&self) -> Option<u64> {
        match self {
            Self::Origin => None,
            Self::At(tip) => Some(tip.slot),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OriginOr<T> {
    Tag(String),
    Value(T),
}

fn deserialize_origin_or<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match OriginOr::<T>::deserialize(deserializer)? {
        OriginOr::Tag(tag) if tag == ORIGIN => Ok(None),
        OriginOr::Tag(tag) => Err(D::Error::custom(format!("unexpected point tag: {tag}"))),
        OriginOr::Value(value) => Ok(Some(value)),
    }
}

impl Serialize for ChainPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Origin => serializer.serialize_str(ORIGIN),
            Self::At(point) => point.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChainPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(deserialize_origin_or::<_, Point>(deserializer)?.map_or(Self::Origin, Self::At))
    }
}

impl Serialize for ChainTip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Origin => serializer.serialize_str(ORIGIN),
            Self::At(tip) => tip.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChainTip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(deserialize_origin_or::<_, Tip>(deserializer)?.map_or(Self::Origin, Self::At))
    }
}
