//! The chain-sync event source feeding the aggregator.

mod client;
pub use client::OgmiosClient;

mod error;
pub use error::SourceError;

mod metrics;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utxodex_types::{Block, ChainPoint, ChainTip};

/// One chain-sync notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction")]
pub enum ChainSyncEvent {
    /// A block extending the chain.
    #[serde(rename = "forward")]
    RollForward {
        /// The new block.
        block: Box<Block>,
        /// The node's tip after applying the block.
        tip: ChainTip,
    },
    /// The chain switched fork; everything after `point` is no longer canonical.
    #[serde(rename = "backward")]
    RollBackward {
        /// The last point still on the canonical chain.
        point: ChainPoint,
        /// The node's tip after the switch.
        tip: ChainTip,
    },
}

/// Result of a successful intersection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intersection {
    /// The best point known to both sides.
    pub intersection: ChainPoint,
    /// The node's current tip.
    pub tip: ChainTip,
}

/// A chain-sync session with a node.
///
/// Events are pulled one at a time: the next event is only requested once the caller is
/// done with the current one.
#[async_trait]
pub trait ChainSyncSource: Send + Sync + Debug {
    /// Positions the session on the best of `points` known to the node.
    async fn find_intersection(&self, points: Vec<ChainPoint>)
    -> Result<Intersection, SourceError>;

    /// Requests the next chain-sync event.
    async fn next_event(&self) -> Result<ChainSyncEvent, SourceError>;

    /// Drops the underlying connection so the next request starts a new session.
    async fn reset(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_roll_forward() {
        let event: ChainSyncEvent = serde_json::from_value(json!({
            "direction": "forward",
            "block": {
                "type": "praos",
                "era": "conway",
                "id": "1111111111111111111111111111111111111111111111111111111111111111",
                "height": 12,
                "slot": 340,
                "transactions": []
            },
            "tip": {
                "slot": 400,
                "id": "2222222222222222222222222222222222222222222222222222222222222222",
                "height": 14
            }
        }))
        .unwrap();

        let ChainSyncEvent::RollForward { block, tip } = event else {
            panic!("expected a forward event");
        };
        assert_eq!(block.height, 12);
        assert_eq!(block.slot, 340);
        assert_eq!(tip.height(), Some(14));
    }

    #[test]
    fn test_deserialize_roll_backward_to_origin() {
        let event: ChainSyncEvent = serde_json::from_value(json!({
            "direction": "backward",
            "point": "origin",
            "tip": "origin"
        }))
        .unwrap();
        assert_eq!(event, ChainSyncEvent::RollBackward {
            point: ChainPoint::Origin,
            tip: ChainTip::Origin
        });
    }

    #[test]
    fn test_deserialize_intersection() {
        let intersection: Intersection = serde_json::from_value(json!({
            "intersection": {
                "slot": 100,
                "id": "3333333333333333333333333333333333333333333333333333333333333333"
            },
            "tip": {
                "slot": 400,
                "id": "2222222222222222222222222222222222222222222222222222222222222222",
                "height": 14
            }
        }))
        .unwrap();
        assert_eq!(intersection.intersection.slot_or(0), 100);
    }
}
