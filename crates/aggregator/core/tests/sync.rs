//! End-to-end chain-sync behaviour against a real [`IndexDb`].

mod common;

use alloy_primitives::B256;
use common::*;
use rstest::rstest;
use std::{collections::BTreeSet, sync::Arc};
use tokio_util::sync::CancellationToken;
use utxodex_core::{
    ChainSyncDriver, SyncError,
    config::{OriginPoint, RepairConfig, SyncConfig},
    source::{ChainSyncEvent, SourceError},
};
use utxodex_storage::{IndexDb, IndexReader, IndexSnapshot};
use utxodex_types::{Block, ChainPoint, TransactionOutput, UtxoId};

type Driver = ChainSyncDriver<IndexDb, ScriptedSource>;

fn sync_config() -> SyncConfig {
    SyncConfig { origin: OriginPoint::GENESIS, ..Default::default() }
}

/// A driver fed directly through `handle_event`.
fn manual_driver(sync: SyncConfig) -> (Driver, Arc<IndexDb>) {
    let db = Arc::new(IndexDb::in_memory().unwrap());
    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::new([], cancel_token.clone()));
    (ChainSyncDriver::new(sync, db.clone(), source, cancel_token), db)
}

fn indexed(blocks: &[Block]) -> IndexSnapshot {
    let (mut driver, db) = manual_driver(sync_config());
    for block in blocks {
        driver.handle_event(forward(block)).unwrap();
    }
    db.snapshot().unwrap()
}

#[test]
fn test_spend_and_rollbacks() {
    utxodex_cli::init_test_tracing();
    let (mut driver, db) = manual_driver(sync_config());
    let produced = UtxoId::new(B256::repeat_byte(0xaa), 0);

    // Slot 100 produces the output, slot 150 spends it.
    let producer = block(2, vec![tx(produced.tx_hash, &[], 1)]);
    let spender = block(3, vec![tx(B256::repeat_byte(0xbb), &[produced], 1)]);
    assert_eq!((producer.slot, spender.slot), (100, 150));

    driver.handle_event(forward(&producer)).unwrap();
    driver.handle_event(forward(&spender)).unwrap();
    assert_eq!(db.get_output(&produced).unwrap().unwrap().spend_slot, Some(150));

    driver.handle_event(backward(120, 3)).unwrap();
    let output = db.get_output(&produced).unwrap().unwrap();
    assert_eq!(output.spend_slot, None);
    assert_eq!(output.slot, 100);

    driver.handle_event(backward(90, 3)).unwrap();
    assert_eq!(db.get_output(&produced).unwrap(), None);
    assert!(db.snapshot().unwrap().blocks.is_empty());
}

#[test]
fn test_applying_blocks_twice_is_idempotent() {
    let chain = linear_chain(6);

    let (mut driver, db) = manual_driver(sync_config());
    for block in &chain {
        driver.handle_event(forward(block)).unwrap();
        driver.handle_event(forward(block)).unwrap();
    }

    assert_eq!(db.snapshot().unwrap(), indexed(&chain));
}

#[rstest]
fn test_rollback_is_inverse_of_forward(
    #[values(1, 2, 3, 4, 5)] keep: usize,
    #[values(false, true)] buffered: bool,
) {
    let chain = linear_chain(6);
    let sync = SyncConfig { buffer_size: 1_000, ..sync_config() };
    let (mut driver, db) = manual_driver(sync);

    for block in &chain {
        let mut event = forward(block);
        if buffered {
            // Far from the tip nothing is flushed until the rollback forces it.
            if let ChainSyncEvent::RollForward { tip, .. } = &mut event {
                *tip = tip_at(10_000);
            }
        }
        driver.handle_event(event).unwrap();
    }
    driver.handle_event(backward(chain[keep - 1].slot, 6)).unwrap();

    assert_eq!(db.snapshot().unwrap(), indexed(&chain[..keep]));
}

#[test]
fn test_spends_point_at_later_spending_blocks() {
    let mut chain = linear_chain(6);
    // Block 6 also spends the second output of block 2.
    chain[5].transactions.push(tx(
        B256::repeat_byte(0xcc),
        &[UtxoId::new(tx_hash(2, 0), 1)],
        1,
    ));

    let snapshot = indexed(&chain);
    let spent: Vec<_> =
        snapshot.outputs.iter().filter(|output| output.spend_slot.is_some()).collect();
    assert_eq!(spent.len(), 6);

    for output in spent {
        let spend_slot = output.spend_slot.unwrap();
        assert!(spend_slot > output.slot, "{} spent at its own slot", output.utxo_id);
        let spender = chain.iter().find(|block| block.slot == spend_slot).unwrap();
        assert!(spender.spent_references().any(|utxo_id| utxo_id == output.utxo_id));
    }
}

#[test]
fn test_pruning_keeps_spends_inside_immutability_window() {
    let chain = linear_chain(10);
    let sync = SyncConfig { immutability_window: 120, ..sync_config() };
    let (mut driver, db) = manual_driver(sync);
    for block in &chain {
        driver.handle_event(forward(block)).unwrap();
    }

    let latest_slot = chain.last().unwrap().slot;
    let snapshot = db.snapshot().unwrap();
    for output in &snapshot.outputs {
        if let Some(spend_slot) = output.spend_slot {
            assert!(spend_slot >= latest_slot - 120, "{} should be pruned", output.utxo_id);
        }
    }

    // Spent at slot 100, long behind the window.
    assert_eq!(db.get_output(&UtxoId::new(tx_hash(1, 0), 0)).unwrap(), None);
    // Never spent.
    assert!(db.get_output(&UtxoId::new(tx_hash(1, 0), 1)).unwrap().is_some());
    // Spent at slot 450, inside the window.
    assert_eq!(
        db.get_output(&UtxoId::new(tx_hash(8, 0), 0)).unwrap().unwrap().spend_slot,
        Some(450)
    );
}

#[tokio::test]
async fn test_resumed_session_replays_to_same_state() {
    let chain = linear_chain(8);
    let db = Arc::new(IndexDb::in_memory().unwrap());
    let sync = SyncConfig { intersect_offset: 2, ..sync_config() };

    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::forwards(&chain[..6], cancel_token.clone()));
    ChainSyncDriver::new(sync.clone(), db.clone(), source.clone(), cancel_token)
        .run()
        .await
        .unwrap();
    assert_eq!(source.intersections(), vec![vec![ChainPoint::Origin]]);
    assert_eq!(db.snapshot().unwrap().blocks.len(), 6);

    // Block 4 is two blocks behind the latest one; blocks 5 and 6 are replayed.
    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::forwards(&chain[4..], cancel_token.clone()));
    ChainSyncDriver::new(sync, db.clone(), source.clone(), cancel_token).run().await.unwrap();
    assert_eq!(source.intersections(), vec![vec![point_of(&chain[3])]]);

    assert_eq!(db.snapshot().unwrap(), indexed(&chain));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_restarts_from_intersect() {
    let chain = linear_chain(6);
    let db = Arc::new(IndexDb::in_memory().unwrap());
    let sync = SyncConfig { intersect_offset: 1, ..sync_config() };

    let script = chain[..4]
        .iter()
        .map(|block| Ok(forward(block)))
        .chain([Err(SourceError::Disconnected)])
        .chain(chain[3..].iter().map(|block| Ok(forward(block))));
    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::new(script, cancel_token.clone()));

    ChainSyncDriver::new(sync, db.clone(), source.clone(), cancel_token).run().await.unwrap();

    assert_eq!(source.resets(), 1);
    assert_eq!(
        source.intersections(),
        vec![vec![ChainPoint::Origin], vec![point_of(&chain[2])]]
    );
    assert_eq!(db.snapshot().unwrap(), indexed(&chain));
}

#[tokio::test]
async fn test_invalid_address_stops_driver() {
    let mut bad = block(1, vec![tx(B256::repeat_byte(0xdd), &[], 1)]);
    bad.transactions[0].outputs.push(TransactionOutput {
        address: "addr1notbech32".to_string(),
        value: serde_json::json!({ "ada": { "lovelace": 1 } }),
        datum_hash: None,
        datum: None,
        script: None,
    });

    let db = Arc::new(IndexDb::in_memory().unwrap());
    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::forwards([&bad], cancel_token.clone()));

    let err = ChainSyncDriver::new(sync_config(), db.clone(), source.clone(), cancel_token)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Decode(_)));
    assert_eq!(source.resets(), 0);
    assert!(db.snapshot().unwrap().blocks.is_empty());
}

#[tokio::test]
async fn test_gap_repair_converges_to_full_index() {
    utxodex_cli::init_test_tracing();
    let chain = linear_chain(8);
    let missing = BTreeSet::from([3, 5]);

    // An index that skipped the blocks at the missing heights.
    let (mut driver, db) = manual_driver(sync_config());
    for block in chain.iter().filter(|block| !missing.contains(&block.height)) {
        driver.handle_event(forward(block)).unwrap();
    }
    let gapped = db.snapshot().unwrap();
    assert_eq!(gapped.blocks.len(), 6);
    assert_ne!(gapped, indexed(&chain));

    let sync = SyncConfig {
        intersect_offset: 0,
        repair: RepairConfig { missing_heights: missing, continue_from_height: None },
        ..sync_config()
    };
    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::forwards(&chain[2..], cancel_token.clone()));
    ChainSyncDriver::new(sync, db.clone(), source.clone(), cancel_token).run().await.unwrap();

    // Replay starts below the oldest missing height.
    assert_eq!(source.intersections(), vec![vec![point_of(&chain[1])]]);
    assert_eq!(db.snapshot().unwrap(), indexed(&chain));
}

#[tokio::test]
async fn test_gap_repair_honours_continue_from_height() {
    let chain = linear_chain(8);
    let (mut driver, db) = manual_driver(sync_config());
    for block in chain.iter().filter(|block| block.height != 6) {
        driver.handle_event(forward(block)).unwrap();
    }

    let sync = SyncConfig {
        intersect_offset: 0,
        repair: RepairConfig {
            missing_heights: BTreeSet::from([3, 6]),
            continue_from_height: Some(5),
        },
        ..sync_config()
    };
    let cancel_token = CancellationToken::new();
    let source = Arc::new(ScriptedSource::forwards(&chain[4..], cancel_token.clone()));
    ChainSyncDriver::new(sync, db.clone(), source.clone(), cancel_token).run().await.unwrap();

    assert_eq!(source.intersections(), vec![vec![point_of(&chain[3])]]);
    assert_eq!(db.snapshot().unwrap(), indexed(&chain));
}
