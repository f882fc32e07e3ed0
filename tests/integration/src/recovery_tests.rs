//! Crash recovery and checkpoint behaviour across restarts

use crate::test_utils::*;
use witness_core::{
    AttestationStore, ChainRole, Direction, NodeMode, StoreError,
};
use witness_engine::{NodeError, Response, WitnessNode};

async fn run_events(node: &mut WitnessNode, events: Vec<witness_core::ChainEvent>) {
    let router = node.spawn_channel_engines(16).unwrap();
    for event in events {
        router.route(event).await.unwrap();
    }
    drop(router);
    node.join().await.unwrap();
}

#[tokio::test]
async fn test_checkpoint_tracks_highest_committed_ledger() {
    let db = TempDb::new("test_checkpoint");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();

    run_events(
        &mut node,
        (0..5)
            .map(|i| claim_event(ChainRole::Locking, &format!("T{}", i), 100 + i, i as u64, foo("1")))
            .collect(),
    )
    .await;
    drop(node);

    let store = AttestationStore::open(&db.path).unwrap();
    let checkpoint = store.get_sync_state(ChainRole::Locking).unwrap().unwrap();
    assert_eq!(checkpoint.last_ledger_sequence, 104);
    assert_eq!(checkpoint.last_transaction_id.as_deref(), Some("T4"));

    let untouched = store.get_sync_state(ChainRole::Issuing).unwrap().unwrap();
    assert_eq!(untouched.last_ledger_sequence, 0);
    assert_eq!(untouched.last_transaction_id, None);
}

#[tokio::test]
async fn test_restart_discards_replayed_events() {
    let db = TempDb::new("test_replay");
    let events: Vec<_> = (0..3)
        .map(|i| claim_event(ChainRole::Issuing, &format!("T{}", i), 50 + i, i as u64, foo("2")))
        .collect();

    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();
    run_events(&mut node, events.clone()).await;
    drop(node);

    // The observer replays everything it had sent before the restart
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();
    let mut replay = events;
    replay.push(claim_event(ChainRole::Issuing, "T3", 53, 3, foo("2")));
    run_events(&mut node, replay).await;

    let Response::Success { result } = node
        .dispatcher()
        .handle_value(serde_json::json!({"method": "server_info"}))
    else {
        panic!("server_info failed");
    };
    assert_eq!(result["engines"]["issuing"]["discarded_total"], serde_json::json!(3));
    assert_eq!(result["engines"]["issuing"]["events_processed_total"], serde_json::json!(1));

    let store = node.store().unwrap();
    assert_eq!(store.attestation_count(Direction::IssuingToLocking).unwrap(), 4);
}

#[tokio::test]
async fn test_interrupted_batch_leaves_last_committed_checkpoint() {
    let db = TempDb::new("test_interrupted");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();
    run_events(
        &mut node,
        vec![claim_event(ChainRole::Locking, "T1", 10, 1, foo("3"))],
    )
    .await;
    let store = std::sync::Arc::clone(node.store().unwrap());
    drop(node);

    // A batch that dies between the insert and the checkpoint advance
    let committed = store
        .lookup_claim(Direction::LockingToIssuing, &foo_bridge(), 1, &foo("3"))
        .unwrap()
        .unwrap();
    let mut next = committed.clone();
    next.transaction_id = "T2".to_string();
    next.ledger_sequence = 11;
    next.claim_key = witness_core::ClaimKey::Claim(2);

    let result: Result<(), StoreError> = store.write(|w| {
        w.try_insert_claim(&next)?;
        Err(StoreError::InvalidRecord("simulated crash".to_string()))
    });
    assert!(result.is_err());
    drop(store);

    let store = AttestationStore::open(&db.path).unwrap();
    let checkpoint = store.get_sync_state(ChainRole::Locking).unwrap().unwrap();
    assert_eq!(checkpoint.last_ledger_sequence, 10);
    assert_eq!(checkpoint.last_transaction_id.as_deref(), Some("T1"));
    assert_eq!(store.attestation_count(Direction::LockingToIssuing).unwrap(), 1);
}

#[tokio::test]
async fn test_store_ahead_of_checkpoint_refuses_to_start() {
    let db = TempDb::new("test_corrupt");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();
    run_events(
        &mut node,
        vec![claim_event(ChainRole::Locking, "T1", 10, 1, foo("3"))],
    )
    .await;

    node.store()
        .unwrap()
        .__test_execute_raw_sql(
            "UPDATE sync_state SET ledger_seq = 5 WHERE chain = 'locking'",
            &[],
        )
        .unwrap();
    drop(node);

    let result = WitnessNode::open(node_config(NodeMode::Persistent, &db.path));
    assert!(matches!(
        result,
        Err(NodeError::Storage(StoreError::CorruptionDetected(_)))
    ));
}
