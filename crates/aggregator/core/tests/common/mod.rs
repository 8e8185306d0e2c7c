//! Shared helpers for the chain-sync integration tests.
#![allow(dead_code, unreachable_pub)]

use alloy_primitives::B256;
use async_trait::async_trait;
use serde_json::json;
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio_util::sync::CancellationToken;
use utxodex_core::source::{ChainSyncEvent, ChainSyncSource, Intersection, SourceError};
use utxodex_types::{
    Block, ChainPoint, ChainTip, Era, HexHash, OutputReference, Point, Tip, Transaction,
    TransactionId, TransactionOutput, UtxoId,
};

pub const BASE_ADDR: &str = "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x";
pub const ENTERPRISE_ADDR: &str = "addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8";

/// Slot distance between consecutive test blocks.
pub const SLOT_STEP: u64 = 50;

pub fn block_hash(height: u64) -> B256 {
    B256::left_padding_from(&height.to_be_bytes())
}

pub fn tx_hash(height: u64, index: u8) -> B256 {
    let mut bytes = height.to_be_bytes().to_vec();
    bytes.extend([0xff, index]);
    B256::left_padding_from(&bytes)
}

pub fn slot_of(height: u64) -> u64 {
    height * SLOT_STEP
}

/// A transaction spending `inputs` and producing `outputs` outputs, alternating between a
/// base and an enterprise address.
pub fn tx(id: B256, inputs: &[UtxoId], outputs: usize) -> Transaction {
    Transaction {
        id: HexHash(id),
        inputs: inputs
            .iter()
            .map(|utxo_id| OutputReference {
                transaction: TransactionId { id: HexHash(utxo_id.tx_hash) },
                index: utxo_id.index,
            })
            .collect(),
        outputs: (0..outputs)
            .map(|i| TransactionOutput {
                address: if i % 2 == 0 { BASE_ADDR } else { ENTERPRISE_ADDR }.to_string(),
                value: json!({ "ada": { "lovelace": 1_000_000 + i } }),
                datum_hash: None,
                datum: None,
                script: None,
            })
            .collect(),
        datums: Default::default(),
    }
}

pub fn block(height: u64, transactions: Vec<Transaction>) -> Block {
    Block {
        era: Era::Babbage,
        id: HexHash(block_hash(height)),
        height,
        slot: slot_of(height),
        transactions,
    }
}

/// A chain where block `h` produces two outputs and spends the first output of block `h - 1`.
pub fn linear_chain(len: u64) -> Vec<Block> {
    (1..=len)
        .map(|height| {
            let inputs: Vec<UtxoId> = if height > 1 {
                vec![UtxoId::new(tx_hash(height - 1, 0), 0)]
            } else {
                vec![]
            };
            block(height, vec![tx(tx_hash(height, 0), &inputs, 2)])
        })
        .collect()
}

pub fn point_of(block: &Block) -> ChainPoint {
    ChainPoint::At(Point::new(block.slot, block.id.0))
}

pub fn tip_at(height: u64) -> ChainTip {
    ChainTip::At(Tip { slot: slot_of(height), id: HexHash(block_hash(height)), height })
}

/// A forward event with the tip at the block itself, so every block is flushed on arrival.
pub fn forward(block: &Block) -> ChainSyncEvent {
    ChainSyncEvent::RollForward { block: Box::new(block.clone()), tip: tip_at(block.height) }
}

pub fn backward(slot: u64, tip_height: u64) -> ChainSyncEvent {
    ChainSyncEvent::RollBackward {
        point: ChainPoint::At(Point::new(slot, block_hash(slot / SLOT_STEP))),
        tip: tip_at(tip_height),
    }
}

/// A [`ChainSyncSource`] replaying a fixed script.
///
/// Once the script is exhausted the source cancels `cancel_token` and never answers again.
#[derive(Debug)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<ChainSyncEvent, SourceError>>>,
    intersections: Mutex<Vec<Vec<ChainPoint>>>,
    resets: AtomicUsize,
    cancel_token: CancellationToken,
}

impl ScriptedSource {
    pub fn new(
        script: impl IntoIterator<Item = Result<ChainSyncEvent, SourceError>>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            intersections: Mutex::new(Vec::new()),
            resets: AtomicUsize::new(0),
            cancel_token,
        }
    }

    pub fn forwards<'a>(
        blocks: impl IntoIterator<Item = &'a Block>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self::new(blocks.into_iter().map(|block| Ok(forward(block))), cancel_token)
    }

    /// Every point list passed to `find_intersection`, in call order.
    pub fn intersections(&self) -> Vec<Vec<ChainPoint>> {
        self.intersections.lock().unwrap().clone()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainSyncSource for ScriptedSource {
    async fn find_intersection(
        &self,
        points: Vec<ChainPoint>,
    ) -> Result<Intersection, SourceError> {
        let intersection = points.first().copied().unwrap_or(ChainPoint::Origin);
        self.intersections.lock().unwrap().push(points);
        Ok(Intersection { intersection, tip: ChainTip::Origin })
    }

    async fn next_event(&self) -> Result<ChainSyncEvent, SourceError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(event) => event,
            None => {
                self.cancel_token.cancel();
                std::future::pending().await
            }
        }
    }

    async fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
