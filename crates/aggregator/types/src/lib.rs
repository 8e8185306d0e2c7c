//! Core types shared across utxodex components.
//!
//! This crate defines the wire shapes received from the chain-sync event source
//! (blocks, transactions, points and tips), the facts the aggregator derives from
//! them, and the records handed back by the index reader.

mod hex_hash;
pub use hex_hash::HexHash;

mod point;
pub use point::{ChainPoint, ChainTip, ORIGIN, Point, Tip};

mod block;
pub use block::{Block, Era, OutputReference, Transaction, TransactionId, TransactionOutput};

mod utxo;
pub use utxo::{UtxoId, UtxoIdError};

mod address;
pub use address::{AddressError, CREDENTIAL_LEN, ShelleyAddress};

mod facts;
pub use facts::{AddressEntry, BlockRef, FactBatch, OutputEntry, SpendEntry, TransactionEntry};

mod records;
pub use records::{OutputRecord, TransactionRecord};
