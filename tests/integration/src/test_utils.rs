//! Shared fixtures for the witness integration tests

use std::path::{Path, PathBuf};
use witness_core::config::{NodeSection, SigningSection};
use witness_core::{
    AccountCreateEvent, AccountId, Amount, BridgeDescriptor, ChainEvent, ChainRole, ClaimEvent,
    Currency, Issue, NodeConfig, NodeMode,
};

/// Secret key shared by every test witness
pub const TEST_SECRET_HEX: &str =
    "2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a";

pub fn account(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

/// Issued-asset bridge between door `rDA` (locking) and door `rDB` (issuing)
pub fn foo_bridge() -> BridgeDescriptor {
    BridgeDescriptor::new(
        account("rDA"),
        Issue::Issued {
            currency: Currency::new("FOO").unwrap(),
            issuer: account("rIssuer"),
        },
        account("rDB"),
        Issue::Issued {
            currency: Currency::new("FOO").unwrap(),
            issuer: account("rDB"),
        },
    )
    .unwrap()
}

pub fn foo(value: &str) -> Amount {
    Amount::issued(value, "FOO", "rIssuer").unwrap()
}

pub fn claim_event(source: ChainRole, tx: &str, ledger: u32, seq: u64, amount: Amount) -> ChainEvent {
    ChainEvent::Claim(ClaimEvent {
        source,
        transaction_id: tx.to_string(),
        ledger_sequence: ledger,
        claim_sequence: seq,
        delivered_amount: amount,
        bridge: foo_bridge(),
        sending_account: account("rAlice"),
        reward_account: account("rAliceReward"),
        other_chain_destination: Some(account("rBob")),
        success: true,
    })
}

pub fn create_event(source: ChainRole, tx: &str, ledger: u32, count: u64) -> ChainEvent {
    ChainEvent::CreateAccount(AccountCreateEvent {
        source,
        transaction_id: tx.to_string(),
        ledger_sequence: ledger,
        create_count: count,
        delivered_amount: foo("25"),
        reward_amount: foo("0.5"),
        bridge: foo_bridge(),
        sending_account: account("rAlice"),
        reward_account: account("rAliceReward"),
        other_chain_destination: account("rNewAccount"),
        success: true,
    })
}

/// Node configuration for `mode` with a store at `db_path`
pub fn node_config(mode: NodeMode, db_path: &Path) -> NodeConfig {
    NodeConfig {
        node: NodeSection {
            db_path: db_path.to_path_buf(),
            mode,
            retry_delay_ms: 10,
            ..NodeSection::default()
        },
        signing: SigningSection {
            key: TEST_SECRET_HEX.to_string(),
            signing_account: Some(account("rWitness")),
        },
        bridge: foo_bridge(),
    }
}

/// Temporary database path removed on drop
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new(prefix: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{}_{}.db", prefix, uuid::Uuid::new_v4()));
        Self { path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
        std::fs::remove_file(self.path.with_extension("db-wal")).ok();
        std::fs::remove_file(self.path.with_extension("db-shm")).ok();
    }
}
