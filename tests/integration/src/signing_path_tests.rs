//! The persistent engine and the stateless signer must sign byte-identical
//! messages, so their signatures combine into one threshold proof.

use crate::test_utils::*;
use serde_json::json;
use std::sync::Arc;
use witness_core::{ChainRole, ClaimKey, Direction, NodeMode};
use witness_crypto::Identity;
use witness_engine::{resolve_direction, QueryError, Response, StatelessSigner, WitnessNode};

#[tokio::test]
async fn test_stateless_and_persistent_signatures_match() {
    let db = TempDb::new("test_paths");
    let mut node = WitnessNode::open(node_config(NodeMode::Persistent, &db.path)).unwrap();

    let router = node.spawn_channel_engines(4).unwrap();
    router
        .route(claim_event(ChainRole::Locking, "T1", 1_000, 22, foo("13.1")))
        .await
        .unwrap();
    router
        .route(create_event(ChainRole::Issuing, "T2", 2_000, 9))
        .await
        .unwrap();
    drop(router);
    node.join().await.unwrap();

    let store = node.store().unwrap();
    let claim = store
        .lookup_claim(Direction::LockingToIssuing, &foo_bridge(), 22, &foo("13.1"))
        .unwrap()
        .unwrap();
    let created = store
        .lookup_account_create(Direction::IssuingToLocking, &foo_bridge(), 9)
        .unwrap()
        .unwrap();

    // A separate stateless deployment of the same key
    let mut stateless_config = node_config(NodeMode::Stateless, &db.path);
    stateless_config.node.db_path = std::path::PathBuf::new();
    let stateless = WitnessNode::open(stateless_config).unwrap();
    let signer = StatelessSigner::new(Arc::clone(stateless.identity()));

    let signed = signer
        .sign(&account("rDB"), &foo_bridge(), &foo("13.1"), ClaimKey::Claim(22))
        .unwrap();
    assert_eq!(signed.direction, Direction::LockingToIssuing);
    assert_eq!(signed.signature, claim.signature);
    assert_eq!(signed.signing_key, claim.public_key);

    let signed = signer
        .sign(&account("rDA"), &foo_bridge(), &foo("25"), ClaimKey::CreateAccount(9))
        .unwrap();
    assert_eq!(signed.signature, created.signature);

    // The same through the stateless dispatcher
    let response = stateless.dispatcher().handle_value(json!({
        "method": "sign",
        "params": {
            "dst_door": "rDB",
            "bridge_descriptor": serde_json::to_value(foo_bridge()).unwrap(),
            "amount": {"currency": "FOO", "issuer": "rIssuer", "value": "13.1"},
            "sequence_number": "22",
        }
    }));
    let Response::Success { result } = response else {
        panic!("sign failed: {:?}", response);
    };
    assert_eq!(result["signature"], json!(hex::encode(&claim.signature)));
}

#[test]
fn test_stateless_sign_rejects_foreign_door() {
    let identity = Arc::new(Identity::from_secret(&[1u8; 32], None).unwrap());
    let signer = StatelessSigner::new(identity);
    let result = signer.sign(
        &account("rSomewhereElse"),
        &foo_bridge(),
        &foo("1"),
        ClaimKey::Claim(1),
    );
    assert!(matches!(result, Err(QueryError::InvalidDirection { .. })));
}

#[test]
fn test_direction_resolution() {
    let bridge = foo_bridge();
    assert_eq!(
        resolve_direction(&bridge, &account("rDA")).unwrap(),
        Direction::LockingToIssuing
    );
    assert_eq!(
        resolve_direction(&bridge, &account("rDB")).unwrap(),
        Direction::IssuingToLocking
    );
    for stranger in ["rIssuer", "rAlice", "rda"] {
        assert!(matches!(
            resolve_direction(&bridge, &account(stranger)),
            Err(QueryError::InvalidDirection { .. })
        ));
    }
}
