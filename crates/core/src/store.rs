//! Attestation Store - Durable, Transactional Witness Storage
//!
//! This module persists every attestation the node produces, together with
//! the per-chain sync checkpoints, with:
//! - SQLite backend with WAL mode for durability
//! - Write-once rows (no updates or deletes)
//! - Atomic conditional insert as the deduplication point
//! - Checkpoint advances committed in the same transaction as the inserts
//! - Startup consistency checks between attestations and checkpoints
//!
//! # Layout
//!
//! One claim table and one account-create table per transfer direction, each
//! keyed by `(bridge_key, transaction_id)` with a unique index on
//! `(bridge_key, claim_id)` serving lookups by claim key. `bridge_key` is the
//! BLAKE3 hash of the bridge descriptor, so two bridges never share rows.
//! The `sync_state` table holds one checkpoint row per chain role.
//!
//! # Guarantees
//!
//! - At most one attestation per transaction id and per claim key
//! - A duplicate insert returns the stored attestation unchanged
//! - Checkpoints never move backwards
//! - A failed write batch leaves no trace (the whole batch rolls back)

use crate::amount::{AccountId, Amount};
use crate::attestation::Attestation;
use crate::bridge::BridgeDescriptor;
use crate::chain::{ChainRole, Direction};
use crate::event::ClaimKey;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Resumption checkpoint of one chain role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSyncState {
    pub role: ChainRole,
    /// Last transaction whose attestation was committed, if any
    pub last_transaction_id: Option<String>,
    /// Last ledger sequence known to be processed
    pub last_ledger_sequence: u32,
}

/// Outcome of a conditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The attestation was stored
    Inserted,
    /// An attestation for the same transaction or claim key was already
    /// stored; it is returned unchanged
    AlreadyExists(Attestation),
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store corrupted: {0}")]
    CorruptionDetected(String),

    #[error("Checkpoint for {role} cannot move back from ledger {current} to {requested}")]
    CheckpointRegression {
        role: ChainRole,
        current: u32,
        requested: u32,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Observability counters for the store
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StoreMetrics {
    /// Attestations committed
    pub attestations_inserted_total: u64,
    /// Inserts that resolved to an existing attestation
    pub duplicate_inserts_total: u64,
    /// Checkpoint advances committed
    pub checkpoint_advances_total: u64,
}

#[derive(Debug, Default)]
struct Counters {
    inserted: AtomicU64,
    duplicates: AtomicU64,
    checkpoints: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy)]
struct PendingCounts {
    inserted: u64,
    duplicates: u64,
    checkpoints: u64,
    /// Highest ledger of a row inserted in this batch, per source role
    locking_high: Option<u32>,
    issuing_high: Option<u32>,
}

impl PendingCounts {
    fn record_insert(&mut self, role: ChainRole, ledger_sequence: u32) {
        let high = match role {
            ChainRole::Locking => &mut self.locking_high,
            ChainRole::Issuing => &mut self.issuing_high,
        };
        *high = Some(high.map_or(ledger_sequence, |h| h.max(ledger_sequence)));
    }

    fn inserted_high(&self, role: ChainRole) -> Option<u32> {
        match role {
            ChainRole::Locking => self.locking_high,
            ChainRole::Issuing => self.issuing_high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Claim,
    CreateAccount,
}

impl RecordKind {
    fn of(key: ClaimKey) -> Self {
        match key {
            ClaimKey::Claim(_) => RecordKind::Claim,
            ClaimKey::CreateAccount(_) => RecordKind::CreateAccount,
        }
    }

    fn key(self, value: u64) -> ClaimKey {
        match self {
            RecordKind::Claim => ClaimKey::Claim(value),
            RecordKind::CreateAccount => ClaimKey::CreateAccount(value),
        }
    }

    fn table(self, direction: Direction) -> &'static str {
        match (self, direction) {
            (RecordKind::Claim, Direction::LockingToIssuing) => "locking_to_issuing_claims",
            (RecordKind::Claim, Direction::IssuingToLocking) => "issuing_to_locking_claims",
            (RecordKind::CreateAccount, Direction::LockingToIssuing) => {
                "locking_to_issuing_creates"
            }
            (RecordKind::CreateAccount, Direction::IssuingToLocking) => {
                "issuing_to_locking_creates"
            }
        }
    }

    fn reward_column(self) -> &'static str {
        match self {
            RecordKind::Claim => "NULL",
            RecordKind::CreateAccount => "reward_amount",
        }
    }

    const ALL: [RecordKind; 2] = [RecordKind::Claim, RecordKind::CreateAccount];
}

const ATTESTATION_COLUMNS: &str = "transaction_id, ledger_seq, claim_id, success, \
     delivered_amount, bridge, sending_account, reward_account, other_chain_dst, \
     signing_account, public_key, signature";

/// Attestation store with SQLite backend
pub struct AttestationStore {
    conn: Mutex<Connection>,
    path: PathBuf,
    counters: Counters,
}

impl AttestationStore {
    /// Create or open a store at the specified path
    ///
    /// The schema is created on first open. Every open runs the startup
    /// consistency check and fails with [`StoreError::CorruptionDetected`] if
    /// the store holds attestations beyond its own checkpoints.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), "Opening attestation store");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            counters: Counters::default(),
        };

        store.startup_consistency_check()?;

        Ok(store)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let mut ddl = String::new();
        for direction in Direction::ALL {
            for kind in RecordKind::ALL {
                let table = kind.table(direction);
                let reward = match kind {
                    RecordKind::Claim => "",
                    RecordKind::CreateAccount => "reward_amount TEXT NOT NULL,",
                };
                ddl.push_str(&format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {table} (
                        bridge_key BLOB NOT NULL,
                        transaction_id TEXT NOT NULL,
                        ledger_seq INTEGER NOT NULL,
                        claim_id INTEGER NOT NULL,
                        success INTEGER NOT NULL,
                        delivered_amount TEXT NOT NULL,
                        {reward}
                        bridge TEXT NOT NULL,
                        sending_account TEXT NOT NULL,
                        reward_account TEXT NOT NULL,
                        other_chain_dst TEXT,
                        signing_account TEXT NOT NULL,
                        public_key BLOB NOT NULL,
                        signature BLOB NOT NULL,
                        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),
                        PRIMARY KEY (bridge_key, transaction_id)
                    );

                    CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_claim_id
                        ON {table}(bridge_key, claim_id);
                    "#
                ));
            }
        }

        ddl.push_str(
            r#"
            CREATE TABLE IF NOT EXISTS sync_state (
                chain TEXT PRIMARY KEY,
                transaction_id TEXT,
                ledger_seq INTEGER NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
            );
            "#,
        );

        conn.execute_batch(&ddl)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run a write batch in one immediate transaction.
    ///
    /// The batch commits when `f` returns `Ok` and rolls back otherwise, so
    /// attestation inserts and the checkpoint advance that follows them are
    /// persisted together or not at all.
    ///
    /// A batch that inserts attestations beyond its source role's checkpoint
    /// is rolled back with [`StoreError::InvalidRecord`].
    pub fn write<T>(&self, f: impl FnOnce(&StoreWriter<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let writer = StoreWriter {
            tx: &tx,
            pending: Cell::new(PendingCounts::default()),
        };
        let value = f(&writer)?;
        writer.check_checkpoint_coverage()?;
        let pending = writer.pending.get();

        tx.commit()?;

        self.counters
            .inserted
            .fetch_add(pending.inserted, Ordering::Relaxed);
        self.counters
            .duplicates
            .fetch_add(pending.duplicates, Ordering::Relaxed);
        self.counters
            .checkpoints
            .fetch_add(pending.checkpoints, Ordering::Relaxed);

        Ok(value)
    }

    /// Advance a checkpoint in its own transaction.
    ///
    /// Attestation inserts have no such shortcut: they only happen inside
    /// [`write`](Self::write), next to the checkpoint advance that covers them.
    pub fn advance_sync_state(
        &self,
        role: ChainRole,
        transaction_id: &str,
        ledger_sequence: u32,
    ) -> Result<()> {
        self.write(|w| w.advance_sync_state(role, transaction_id, ledger_sequence))
    }

    /// Look up a claim attestation by claim sequence and delivered amount.
    pub fn lookup_claim(
        &self,
        direction: Direction,
        bridge: &BridgeDescriptor,
        claim_sequence: u64,
        amount: &Amount,
    ) -> Result<Option<Attestation>> {
        let kind = RecordKind::Claim;
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {ATTESTATION_COLUMNS}, {reward} FROM {table} \
             WHERE bridge_key = ?1 AND claim_id = ?2 AND delivered_amount = ?3",
            reward = kind.reward_column(),
            table = kind.table(direction),
        );
        let mut stmt = conn.prepare(&sql)?;
        let attestation = stmt
            .query_row(
                params![
                    bridge_key(bridge)?.to_vec(),
                    claim_sequence as i64,
                    serde_json::to_string(amount)?
                ],
                |row| attestation_from_row(row, kind, direction),
            )
            .optional()?;
        Ok(attestation)
    }

    /// Look up an account-create attestation by create count.
    pub fn lookup_account_create(
        &self,
        direction: Direction,
        bridge: &BridgeDescriptor,
        create_count: u64,
    ) -> Result<Option<Attestation>> {
        let kind = RecordKind::CreateAccount;
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {ATTESTATION_COLUMNS}, {reward} FROM {table} \
             WHERE bridge_key = ?1 AND claim_id = ?2",
            reward = kind.reward_column(),
            table = kind.table(direction),
        );
        let mut stmt = conn.prepare(&sql)?;
        let attestation = stmt
            .query_row(
                params![bridge_key(bridge)?.to_vec(), create_count as i64],
                |row| attestation_from_row(row, kind, direction),
            )
            .optional()?;
        Ok(attestation)
    }

    /// Checkpoint of `role`, if one was ever recorded.
    pub fn get_sync_state(&self, role: ChainRole) -> Result<Option<ChainSyncState>> {
        let conn = self.lock()?;
        read_sync_state(&conn, role)
    }

    /// Create the checkpoint row for `role` on first startup and return the
    /// current checkpoint.
    pub fn ensure_sync_state(&self, role: ChainRole) -> Result<ChainSyncState> {
        self.write(|w| {
            w.tx.execute(
                "INSERT INTO sync_state (chain, transaction_id, ledger_seq) VALUES (?1, NULL, 0) \
                 ON CONFLICT(chain) DO NOTHING",
                params![role.as_str()],
            )?;
            read_sync_state(w.tx, role)?.ok_or_else(|| {
                StoreError::CorruptionDetected(format!("sync state for {} vanished", role))
            })
        })
    }

    /// Number of attestations stored for `direction`, claims and account
    /// creations together.
    pub fn attestation_count(&self, direction: Direction) -> Result<u64> {
        let conn = self.lock()?;
        let mut total = 0u64;
        for kind in RecordKind::ALL {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table(direction)),
                [],
                |row| row.get(0),
            )?;
            total += count as u64;
        }
        Ok(total)
    }

    /// Verify that no attestation sourced on a chain lies beyond that chain's
    /// checkpoint.
    ///
    /// Inserts are only reachable through write batches that also advance
    /// the checkpoint, so rows ahead of the checkpoint mean the file was
    /// modified outside this store.
    pub fn startup_consistency_check(&self) -> Result<()> {
        let conn = self.lock()?;

        for direction in Direction::ALL {
            let role = direction.source();
            let mut highest: Option<u32> = None;
            for kind in RecordKind::ALL {
                let max: Option<i64> = conn.query_row(
                    &format!("SELECT MAX(ledger_seq) FROM {}", kind.table(direction)),
                    [],
                    |row| row.get(0),
                )?;
                if let Some(max) = max {
                    highest = Some(highest.map_or(max as u32, |h| h.max(max as u32)));
                }
            }

            let Some(highest) = highest else {
                continue;
            };

            let checkpoint = read_sync_state(&conn, role)?;
            let checkpoint_seq = checkpoint.as_ref().map(|c| c.last_ledger_sequence);
            if checkpoint_seq.map_or(true, |seq| highest > seq) {
                let reason = format!(
                    "{} attestations reach ledger {} but the checkpoint is {:?}",
                    direction, highest, checkpoint_seq
                );
                error!(chain = %role, highest, checkpoint = ?checkpoint_seq, "Store consistency check failed");
                return Err(StoreError::CorruptionDetected(reason));
            }
        }

        info!(path = %self.path.display(), "Store consistency check passed");
        Ok(())
    }

    /// Snapshot of the store counters
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            attestations_inserted_total: self.counters.inserted.load(Ordering::Relaxed),
            duplicate_inserts_total: self.counters.duplicates.load(Ordering::Relaxed),
            checkpoint_advances_total: self.counters.checkpoints.load(Ordering::Relaxed),
        }
    }

    /// Get the database path
    pub fn db_path(&self) -> &Path {
        &self.path
    }

    /// Execute raw SQL for testing purposes only
    ///
    /// **WARNING**: This method bypasses the store's invariants and should
    /// ONLY be used in tests to simulate corruption scenarios.
    #[doc(hidden)]
    pub fn __test_execute_raw_sql(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute(sql, params)?)
    }
}

/// Handle to an open write batch, see [`AttestationStore::write`].
pub struct StoreWriter<'a> {
    tx: &'a Transaction<'a>,
    pending: Cell<PendingCounts>,
}

impl StoreWriter<'_> {
    /// Atomic check-and-insert of a claim attestation keyed by
    /// `(direction, bridge, transaction_id)`.
    pub fn try_insert_claim(&self, attestation: &Attestation) -> Result<InsertOutcome> {
        if attestation.is_account_create() {
            return Err(StoreError::InvalidRecord(format!(
                "{} is not a claim",
                attestation.claim_key
            )));
        }
        self.try_insert(attestation)
    }

    /// Atomic check-and-insert of an account-create attestation.
    pub fn try_insert_account_create(&self, attestation: &Attestation) -> Result<InsertOutcome> {
        if !attestation.is_account_create() {
            return Err(StoreError::InvalidRecord(format!(
                "{} is not an account creation",
                attestation.claim_key
            )));
        }
        self.try_insert(attestation)
    }

    /// Conditionally insert any attestation into the table of its kind and
    /// direction.
    ///
    /// The insert is a single `ON CONFLICT DO NOTHING` statement; when it
    /// changes nothing, the row that blocked it (same transaction id, or same
    /// claim key under another transaction id) is returned.
    pub fn try_insert(&self, attestation: &Attestation) -> Result<InsertOutcome> {
        let kind = RecordKind::of(attestation.claim_key);
        let table = kind.table(attestation.direction);
        let key = bridge_key(&attestation.bridge)?.to_vec();

        let reward = attestation
            .reward_amount
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let changed = match kind {
            RecordKind::Claim => self.tx.execute(
                &format!(
                    "INSERT INTO {table} (bridge_key, {ATTESTATION_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
                     ON CONFLICT DO NOTHING"
                ),
                params![
                    key,
                    attestation.transaction_id,
                    attestation.ledger_sequence,
                    attestation.claim_key.value() as i64,
                    attestation.success,
                    serde_json::to_string(&attestation.delivered_amount)?,
                    serde_json::to_string(&attestation.bridge)?,
                    attestation.sending_account.as_str(),
                    attestation.reward_account.as_str(),
                    attestation.other_chain_destination.as_ref().map(|a| a.as_str()),
                    attestation.signing_account.as_str(),
                    attestation.public_key,
                    attestation.signature,
                ],
            )?,
            RecordKind::CreateAccount => {
                let reward = reward.ok_or_else(|| {
                    StoreError::InvalidRecord(format!(
                        "{} has no reward amount",
                        attestation.claim_key
                    ))
                })?;
                self.tx.execute(
                    &format!(
                        "INSERT INTO {table} (bridge_key, {ATTESTATION_COLUMNS}, reward_amount) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
                         ON CONFLICT DO NOTHING"
                    ),
                    params![
                        key,
                        attestation.transaction_id,
                        attestation.ledger_sequence,
                        attestation.claim_key.value() as i64,
                        attestation.success,
                        serde_json::to_string(&attestation.delivered_amount)?,
                        serde_json::to_string(&attestation.bridge)?,
                        attestation.sending_account.as_str(),
                        attestation.reward_account.as_str(),
                        attestation.other_chain_destination.as_ref().map(|a| a.as_str()),
                        attestation.signing_account.as_str(),
                        attestation.public_key,
                        attestation.signature,
                        reward,
                    ],
                )?
            }
        };

        let mut pending = self.pending.get();
        if changed == 1 {
            pending.inserted += 1;
            pending.record_insert(attestation.direction.source(), attestation.ledger_sequence);
            self.pending.set(pending);

            debug!(
                table,
                tx_id = %attestation.transaction_id,
                claim = %attestation.claim_key,
                "Attestation stored"
            );
            return Ok(InsertOutcome::Inserted);
        }

        let sql = format!(
            "SELECT {ATTESTATION_COLUMNS}, {reward} FROM {table} \
             WHERE bridge_key = ?1 AND (transaction_id = ?2 OR claim_id = ?3) \
             ORDER BY transaction_id = ?2 DESC LIMIT 1",
            reward = kind.reward_column(),
        );
        let existing = self
            .tx
            .query_row(
                &sql,
                params![
                    key,
                    attestation.transaction_id,
                    attestation.claim_key.value() as i64
                ],
                |row| attestation_from_row(row, kind, attestation.direction),
            )
            .optional()?
            .ok_or_else(|| {
                StoreError::CorruptionDetected(format!(
                    "insert into {} conflicted but no conflicting row exists",
                    table
                ))
            })?;

        pending.duplicates += 1;
        self.pending.set(pending);

        debug!(
            table,
            tx_id = %attestation.transaction_id,
            existing_tx_id = %existing.transaction_id,
            claim = %attestation.claim_key,
            "Attestation already stored"
        );
        Ok(InsertOutcome::AlreadyExists(existing))
    }

    /// Move the checkpoint of `role` forward.
    ///
    /// Fails with [`StoreError::CheckpointRegression`] (rolling back the
    /// whole batch) if `ledger_sequence` is below the stored checkpoint.
    pub fn advance_sync_state(
        &self,
        role: ChainRole,
        transaction_id: &str,
        ledger_sequence: u32,
    ) -> Result<()> {
        let changed = self.tx.execute(
            r#"
            INSERT INTO sync_state (chain, transaction_id, ledger_seq) VALUES (?1, ?2, ?3)
            ON CONFLICT(chain) DO UPDATE SET
                transaction_id = excluded.transaction_id,
                ledger_seq = excluded.ledger_seq,
                updated_at = strftime('%s', 'now') * 1000
            WHERE excluded.ledger_seq >= sync_state.ledger_seq
            "#,
            params![role.as_str(), transaction_id, ledger_sequence],
        )?;

        if changed == 0 {
            let current = read_sync_state(self.tx, role)?
                .map(|s| s.last_ledger_sequence)
                .unwrap_or_default();
            return Err(StoreError::CheckpointRegression {
                role,
                current,
                requested: ledger_sequence,
            });
        }

        let mut pending = self.pending.get();
        pending.checkpoints += 1;
        self.pending.set(pending);
        Ok(())
    }

    fn check_checkpoint_coverage(&self) -> Result<()> {
        let pending = self.pending.get();
        for role in ChainRole::ALL {
            let Some(high) = pending.inserted_high(role) else {
                continue;
            };
            let checkpoint = read_sync_state(self.tx, role)?.map(|s| s.last_ledger_sequence);
            if checkpoint.map_or(true, |seq| seq < high) {
                warn!(chain = %role, ledger_seq = high, checkpoint = ?checkpoint, "Rolling back batch without checkpoint advance");
                return Err(StoreError::InvalidRecord(format!(
                    "{} attestation at ledger {} is not covered by checkpoint {:?}",
                    role, high, checkpoint
                )));
            }
        }
        Ok(())
    }

    /// Checkpoint of `role` as seen inside this batch.
    pub fn get_sync_state(&self, role: ChainRole) -> Result<Option<ChainSyncState>> {
        read_sync_state(self.tx, role)
    }
}

/// BLAKE3 partition key of a bridge descriptor.
pub fn bridge_key(bridge: &BridgeDescriptor) -> Result<[u8; 32]> {
    let encoded = serde_json::to_vec(bridge)?;
    Ok(*blake3::hash(&encoded).as_bytes())
}

fn read_sync_state(conn: &Connection, role: ChainRole) -> Result<Option<ChainSyncState>> {
    let state = conn
        .query_row(
            "SELECT transaction_id, ledger_seq FROM sync_state WHERE chain = ?1",
            params![role.as_str()],
            |row| {
                Ok(ChainSyncState {
                    role,
                    last_transaction_id: row.get(0)?,
                    last_ledger_sequence: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(state)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn account_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<AccountId> {
    let text: String = row.get(idx)?;
    AccountId::new(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn attestation_from_row(
    row: &Row<'_>,
    kind: RecordKind,
    direction: Direction,
) -> rusqlite::Result<Attestation> {
    let destination: Option<String> = row.get(8)?;
    let other_chain_destination = destination
        .map(AccountId::new)
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;
    let reward_amount = match kind {
        RecordKind::Claim => None,
        RecordKind::CreateAccount => Some(json_column(row, 12)?),
    };

    Ok(Attestation {
        direction,
        claim_key: kind.key(row.get::<_, i64>(2)? as u64),
        transaction_id: row.get(0)?,
        ledger_sequence: row.get(1)?,
        success: row.get(3)?,
        delivered_amount: json_column(row, 4)?,
        reward_amount,
        bridge: json_column(row, 5)?,
        sending_account: account_column(row, 6)?,
        reward_account: account_column(row, 7)?,
        other_chain_destination,
        signing_account: account_column(row, 9)?,
        public_key: row.get(10)?,
        signature: row.get(11)?,
    })
}
