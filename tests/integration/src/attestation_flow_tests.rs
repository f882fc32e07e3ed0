//! End-to-end attestation flow
//!
//! Events go through the node's router into both role engines; the stored
//! attestations are then read back through the query service and the
//! request dispatcher.

use crate::test_utils::*;
use serde_json::json;
use std::sync::Arc;
use witness_core::{ChainRole, ClaimKey, Direction, NodeMode};
use witness_crypto::encode;
use witness_engine::{QueryError, QueryService, Response, WitnessNode};

async fn run_events(node: &mut WitnessNode, events: Vec<witness_core::ChainEvent>) {
    let router = node.spawn_channel_engines(16).unwrap();
    for event in events {
        router.route(event).await.unwrap();
    }
    drop(router);
    node.join().await.unwrap();
}

#[tokio::test]
async fn test_claim_is_served_for_its_source_door_only() {
    let _ = tracing_subscriber::fmt::try_init();
    let db = TempDb::new("test_e2e");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();

    run_events(
        &mut node,
        vec![claim_event(ChainRole::Locking, "T1", 1_000, 22, foo("13.1"))],
    )
    .await;

    let store = Arc::clone(node.store().unwrap());
    let query = QueryService::new(store);
    let bridge = foo_bridge();

    // The destination door frames the reverse direction, which holds nothing
    let reverse = query
        .witness(&bridge, &foo("13.1"), 22, &account("rDB"))
        .unwrap();
    assert!(reverse.is_none());

    let attestation = query
        .witness(&bridge, &foo("13.1"), 22, &account("rDA"))
        .unwrap()
        .expect("attestation for the source door");
    assert_eq!(attestation.direction, Direction::LockingToIssuing);
    assert_eq!(attestation.transaction_id, "T1");
    assert_eq!(attestation.public_key, node.identity().public_key());
    assert_eq!(attestation.signing_account.as_str(), "rWitness");

    let message = encode(
        &bridge,
        &foo("13.1"),
        ClaimKey::Claim(22),
        Direction::LockingToIssuing,
    );
    assert!(node.identity().verify(&message, &attestation.signature));

    // Equivalent spelling of the same amount hits the same row
    assert!(query
        .witness(&bridge, &foo("13.10"), 22, &account("rDA"))
        .unwrap()
        .is_some());

    assert!(matches!(
        query.witness(&bridge, &foo("13.1"), 22, &account("rStranger")),
        Err(QueryError::InvalidDirection { .. })
    ));
}

#[tokio::test]
async fn test_dispatcher_serves_stored_claim() {
    let db = TempDb::new("test_e2e_rpc");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();

    run_events(
        &mut node,
        vec![claim_event(ChainRole::Locking, "T1", 1_000, 22, foo("13.1"))],
    )
    .await;

    let dispatcher = node.dispatcher();
    let bridge = serde_json::to_value(foo_bridge()).unwrap();
    let request = |door: &str| {
        json!({
            "method": "witness",
            "params": {
                "bridge_descriptor": bridge,
                "amount": {"currency": "FOO", "issuer": "rIssuer", "value": "13.1"},
                "sequence_number": 22,
                "door_account": door,
            }
        })
    };

    assert_eq!(dispatcher.handle_value(request("rDB")), Response::NotFound);

    let Response::Success { result } = dispatcher.handle_value(request("rDA")) else {
        panic!("expected the stored attestation");
    };
    assert_eq!(
        result["signing_key"],
        json!(hex::encode(node.identity().public_key()))
    );
    assert_eq!(result["direction"], json!("locking_to_issuing"));
    assert_eq!(result["sequence_number"], json!(22));
    assert_eq!(result["amount"]["value"], json!("13.1"));
}

#[tokio::test]
async fn test_processing_twice_stores_one_identical_attestation() {
    let db = TempDb::new("test_idempotent");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();
    let event = claim_event(ChainRole::Issuing, "T7", 500, 3, foo("1"));

    run_events(&mut node, vec![event.clone(), event.clone()]).await;
    let store = Arc::clone(node.store().unwrap());
    let first = store
        .lookup_claim(Direction::IssuingToLocking, &foo_bridge(), 3, &foo("1"))
        .unwrap()
        .unwrap();
    drop(node);

    // Re-delivery of the same logical claim under a new transaction id
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();
    run_events(
        &mut node,
        vec![claim_event(ChainRole::Issuing, "T7-again", 501, 3, foo("1"))],
    )
    .await;

    let store = node.store().unwrap();
    let second = store
        .lookup_claim(Direction::IssuingToLocking, &foo_bridge(), 3, &foo("1"))
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second.transaction_id, "T7");
    assert_eq!(store.attestation_count(Direction::IssuingToLocking).unwrap(), 1);

    let checkpoint = store.get_sync_state(ChainRole::Issuing).unwrap().unwrap();
    assert_eq!(checkpoint.last_ledger_sequence, 501);
}

#[tokio::test]
async fn test_both_roles_and_both_event_kinds() {
    let db = TempDb::new("test_both_roles");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();

    run_events(
        &mut node,
        vec![
            claim_event(ChainRole::Locking, "L1", 10, 1, foo("5")),
            claim_event(ChainRole::Issuing, "I1", 20, 1, foo("6")),
            create_event(ChainRole::Locking, "L2", 11, 1),
            create_event(ChainRole::Issuing, "I2", 21, 1),
        ],
    )
    .await;

    let store = node.store().unwrap();
    assert_eq!(store.attestation_count(Direction::LockingToIssuing).unwrap(), 2);
    assert_eq!(store.attestation_count(Direction::IssuingToLocking).unwrap(), 2);

    let query = QueryService::new(Arc::clone(store));
    let created = query
        .witness_account_create(&foo_bridge(), 1, &account("rDB"))
        .unwrap()
        .unwrap();
    assert_eq!(created.transaction_id, "I2");
    assert_eq!(created.reward_amount, Some(foo("0.5")));

    let locking = store.get_sync_state(ChainRole::Locking).unwrap().unwrap();
    let issuing = store.get_sync_state(ChainRole::Issuing).unwrap().unwrap();
    assert_eq!(locking.last_ledger_sequence, 11);
    assert_eq!(issuing.last_ledger_sequence, 21);
}
