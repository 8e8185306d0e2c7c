use crate::decoder::DecodedBlock;
use utxodex_types::{ChainTip, FactBatch};

/// Facts decoded but not yet committed.
///
/// All five categories are flushed together: the block rows decide where a restarted
/// session resumes, so they must never be persisted without the facts derived from them.
#[derive(Debug, Clone)]
pub struct FactBuffer {
    facts: FactBatch,
    buffer_size: usize,
}

impl FactBuffer {
    /// Creates an empty buffer flushing at `buffer_size` facts of one kind far from the tip.
    pub fn new(buffer_size: usize) -> Self {
        Self { facts: FactBatch::default(), buffer_size: buffer_size.max(1) }
    }

    /// Appends the facts of one block.
    pub fn push(&mut self, decoded: DecodedBlock) {
        let DecodedBlock { facts, .. } = decoded;
        self.facts.blocks.extend(facts.blocks);
        self.facts.transactions.extend(facts.transactions);
        self.facts.addresses.extend(facts.addresses);
        self.facts.outputs.extend(facts.outputs);
        self.facts.spends.extend(facts.spends);
    }

    /// The buffered facts.
    pub const fn facts(&self) -> &FactBatch {
        &self.facts
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.facts.clear();
    }

    /// Number of facts of any single kind that triggers a flush after applying a block at
    /// `block_height`.
    ///
    /// Blocks close to `tip`, and every block while repairing, are flushed one at a time.
    pub fn threshold(
        &self,
        block_height: u64,
        tip: &ChainTip,
        near_tip_distance: u64,
        repairing: bool,
    ) -> usize {
        let near_tip = tip
            .height()
            .is_some_and(|tip_height| block_height.saturating_add(near_tip_distance) > tip_height);
        if repairing || near_tip { 1 } else { self.buffer_size }
    }

    /// Returns `true` once any category holds at least `threshold` facts.
    pub fn should_flush(&self, threshold: usize) -> bool {
        !self.is_empty() && self.facts.largest_len() >= threshold
    }
}
