use alloy_primitives::b256;
use derive_more::{Constructor, Display};
use std::str::FromStr;
use thiserror::Error;
use utxodex_types::{ChainPoint, Point};

/// The point the index starts from when nothing has been indexed yet.
///
/// Networks whose early history only contains Byron blocks start at the last Byron block so
/// the first sync skips straight to the Shelley era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct OriginPoint {
    /// The point handed to the event source.
    pub point: ChainPoint,
    /// Height of the block at `point`.
    pub height: u64,
}

impl OriginPoint {
    /// The chain's origin sentinel.
    pub const GENESIS: Self = Self { point: ChainPoint::Origin, height: 0 };

    /// Slot the origin resolves to for rollbacks.
    pub const fn slot(&self) -> u64 {
        self.point.slot_or(0)
    }
}

/// A Cardano network with a known origin point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
pub enum Network {
    /// Cardano mainnet.
    #[default]
    #[display("mainnet")]
    Mainnet,
    /// The pre-production testnet.
    #[display("preprod")]
    Preprod,
    /// The preview testnet.
    #[display("preview")]
    Preview,
}

impl Network {
    /// Returns the origin point of this network.
    pub const fn origin(&self) -> OriginPoint {
        match self {
            Self::Mainnet => OriginPoint {
                point: ChainPoint::At(Point::new(
                    4_492_799,
                    b256!("f8084c61b6a238acec985b59310b6ecec49c0ab8352249afd7268da5cff2a457"),
                )),
                height: 4_490_510,
            },
            Self::Preprod => OriginPoint {
                point: ChainPoint::At(Point::new(
                    1_598_399,
                    b256!("7e16781b40ebf8b6da18f7b5e8ade855d6738095ef2f1c58c77e88b6e45997a4"),
                )),
                height: 46,
            },
            Self::Preview => OriginPoint::GENESIS,
        }
    }
}

/// Returned when a network name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network: {0}, expected one of mainnet, preprod, preview")]
pub struct NetworkParseError(pub String);

impl FromStr for Network {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "preprod" => Ok(Self::Preprod),
            "preview" => Ok(Self::Preview),
            _ => Err(NetworkParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mainnet", Network::Mainnet)]
    #[case("Preprod", Network::Preprod)]
    #[case("PREVIEW", Network::Preview)]
    fn test_parse_network(#[case] input: &str, #[case] expected: Network) {
        assert_eq!(input.parse::<Network>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_network() {
        let err = "sanchonet".parse::<Network>().unwrap_err();
        assert_eq!(err, NetworkParseError("sanchonet".to_string()));
    }

    #[test]
    fn test_network_display_round_trips() {
        for network in [Network::Mainnet, Network::Preprod, Network::Preview] {
            assert_eq!(network.to_string().parse::<Network>().unwrap(), network);
        }
    }

    #[test]
    fn test_origin_points() {
        let mainnet = Network::Mainnet.origin();
        assert_eq!(mainnet.slot(), 4_492_799);
        assert_eq!(mainnet.height, 4_490_510);

        assert_eq!(Network::Preprod.origin().slot(), 1_598_399);
        assert_eq!(Network::Preview.origin(), OriginPoint::GENESIS);
        assert_eq!(OriginPoint::GENESIS.slot(), 0);
    }
}
