//! Attestation Engine - Per-Role Witness Loop
//!
//! One [`RoleEngine`] runs per chain role. For every finalized event it:
//! - Discards events at or behind the role's checkpoint
//! - Encodes the canonical message and signs it
//! - Inserts the attestation and advances the checkpoint in one store
//!   transaction
//!
//! A duplicate insert is an idempotent success. Storage faults are retried
//! with the same signed attestation until the write commits or the node
//! shuts down, so the checkpoint only ever moves past events whose
//! attestation is durable.
//!
//! Shutdown is observed between events and while waiting to retry, never in
//! the middle of a store transaction.

use crate::error::EngineError;
use crate::feed::EventFeed;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};
use witness_core::{
    Attestation, AttestationStore, ChainEvent, ChainRole, ChainSyncState, ClaimKey,
    InsertOutcome, StoreError,
};
use witness_crypto::{encode, Identity};

/// Position of a role engine in its per-event cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Waiting for the next event
    Idle,
    /// Signing an event
    Processing,
    /// Committing the attestation together with the checkpoint
    Advancing,
}

/// Snapshot of a role engine's counters
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMetrics {
    /// Events whose attestation and checkpoint were committed
    pub events_processed_total: u64,
    /// Committed events that resolved to an existing attestation
    pub duplicates_total: u64,
    /// Events discarded by the checkpoint filter
    pub discarded_total: u64,
    /// Events delivered to the wrong role's engine
    pub rejected_total: u64,
    /// Failed store writes (each retry counts)
    pub storage_faults_total: u64,
}

/// Live counters of one role engine, shared with the status endpoint.
#[derive(Debug, Default)]
pub struct EngineCounters {
    processed: AtomicU64,
    duplicates: AtomicU64,
    discarded: AtomicU64,
    rejected: AtomicU64,
    storage_faults: AtomicU64,
}

impl EngineCounters {
    pub fn snapshot(&self) -> EngineMetrics {
        EngineMetrics {
            events_processed_total: self.processed.load(Ordering::Relaxed),
            duplicates_total: self.duplicates.load(Ordering::Relaxed),
            discarded_total: self.discarded.load(Ordering::Relaxed),
            rejected_total: self.rejected.load(Ordering::Relaxed),
            storage_faults_total: self.storage_faults.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Resources shared by both role engines.
#[derive(Clone)]
pub struct EngineContext {
    pub identity: Arc<Identity>,
    pub store: Arc<AttestationStore>,
    pub shutdown: watch::Receiver<bool>,
    pub retry_delay: Duration,
}

/// The witness loop of one chain role.
pub struct RoleEngine<F> {
    role: ChainRole,
    feed: F,
    ctx: EngineContext,
    checkpoint: ChainSyncState,
    state: EngineState,
    counters: Arc<EngineCounters>,
}

impl<F: EventFeed> RoleEngine<F> {
    /// Create the engine for `role`, resuming from its stored checkpoint.
    ///
    /// Reads the store synchronously; call it at startup, before the engine
    /// is spawned. A role without a checkpoint row starts from ledger 0.
    pub fn new(
        role: ChainRole,
        feed: F,
        ctx: EngineContext,
        counters: Arc<EngineCounters>,
    ) -> Result<Self, EngineError> {
        let checkpoint = ctx.store.get_sync_state(role)?.unwrap_or(ChainSyncState {
            role,
            last_transaction_id: None,
            last_ledger_sequence: 0,
        });
        Ok(Self {
            role,
            feed,
            ctx,
            checkpoint,
            state: EngineState::Idle,
            counters,
        })
    }

    pub fn role(&self) -> ChainRole {
        self.role
    }

    pub fn checkpoint(&self) -> &ChainSyncState {
        &self.checkpoint
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn counters(&self) -> Arc<EngineCounters> {
        Arc::clone(&self.counters)
    }

    fn shutdown_requested(&self) -> bool {
        *self.ctx.shutdown.borrow()
    }

    fn transition(&mut self, next: EngineState) {
        trace!(chain = %self.role, from = ?self.state, to = ?next, "Engine state");
        self.state = next;
    }

    /// Run until shutdown is signalled or the feed closes.
    ///
    /// Returns an error only for store faults that retrying cannot fix.
    pub async fn run(mut self) -> Result<(), EngineError> {
        info!(
            chain = %self.role,
            ledger_seq = self.checkpoint.last_ledger_sequence,
            tx_id = ?self.checkpoint.last_transaction_id,
            "Role engine started"
        );

        loop {
            if self.shutdown_requested() {
                break;
            }

            let event = tokio::select! {
                biased;
                changed = self.ctx.shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped: nobody can stop us any more, treat as shutdown
                        break;
                    }
                    continue;
                }
                event = self.feed.next_event() => event,
            };

            let Some(event) = event else {
                info!(chain = %self.role, "Event feed closed");
                break;
            };

            self.process(event).await?;
        }

        info!(
            chain = %self.role,
            ledger_seq = self.checkpoint.last_ledger_sequence,
            "Role engine stopped"
        );
        Ok(())
    }

    /// Handle one event through to a committed checkpoint.
    pub async fn process(&mut self, event: ChainEvent) -> Result<(), EngineError> {
        if event.source() != self.role {
            error!(
                chain = %self.role,
                source = %event.source(),
                tx_id = %event.transaction_id(),
                "Rejecting event routed to the wrong role engine"
            );
            EngineCounters::bump(&self.counters.rejected);
            return Ok(());
        }

        if self.already_seen(&event) {
            debug!(
                chain = %self.role,
                ledger_seq = event.ledger_sequence(),
                tx_id = %event.transaction_id(),
                "Discarding event at or behind checkpoint"
            );
            EngineCounters::bump(&self.counters.discarded);
            return Ok(());
        }

        self.transition(EngineState::Processing);
        let attestation = self.attest(&event);

        self.transition(EngineState::Advancing);
        let committed = self.commit_with_retry(attestation).await;
        self.transition(EngineState::Idle);

        let Some(outcome) = committed? else {
            return Ok(());
        };

        self.checkpoint = ChainSyncState {
            role: self.role,
            last_transaction_id: Some(event.transaction_id().to_string()),
            last_ledger_sequence: event.ledger_sequence(),
        };
        EngineCounters::bump(&self.counters.processed);

        match outcome {
            InsertOutcome::Inserted => {
                info!(
                    chain = %self.role,
                    ledger_seq = event.ledger_sequence(),
                    tx_id = %event.transaction_id(),
                    claim = %event.claim_key(),
                    "Attestation stored"
                );
            }
            InsertOutcome::AlreadyExists(existing) => {
                EngineCounters::bump(&self.counters.duplicates);
                if &existing.delivered_amount != event.delivered_amount() {
                    warn!(
                        chain = %self.role,
                        tx_id = %event.transaction_id(),
                        existing_tx_id = %existing.transaction_id,
                        claim = %event.claim_key(),
                        "Claim key already attested with a different amount; keeping the stored attestation"
                    );
                } else {
                    debug!(
                        chain = %self.role,
                        tx_id = %event.transaction_id(),
                        claim = %event.claim_key(),
                        "Event already attested"
                    );
                }
            }
        }

        Ok(())
    }

    /// Checkpoint filter. Events on the checkpoint's own ledger pass unless
    /// they are the checkpoint transaction itself; deduplication keeps them
    /// idempotent.
    fn already_seen(&self, event: &ChainEvent) -> bool {
        let seq = event.ledger_sequence();
        let checkpoint = &self.checkpoint;
        seq < checkpoint.last_ledger_sequence
            || (seq == checkpoint.last_ledger_sequence
                && checkpoint.last_transaction_id.as_deref() == Some(event.transaction_id()))
    }

    fn attest(&self, event: &ChainEvent) -> Attestation {
        let message = encode(
            event.bridge(),
            event.delivered_amount(),
            event.claim_key(),
            event.direction(),
        );
        let identity = &self.ctx.identity;
        Attestation::from_event(
            event,
            identity.signing_account().clone(),
            identity.public_key(),
            identity.sign(&message),
        )
    }

    /// Commit `attestation` with the checkpoint advance, retrying storage
    /// faults. `Ok(None)` means shutdown arrived before the write committed.
    async fn commit_with_retry(
        &mut self,
        attestation: Attestation,
    ) -> Result<Option<InsertOutcome>, EngineError> {
        let attestation = Arc::new(attestation);
        loop {
            let store = Arc::clone(&self.ctx.store);
            match commit(store, self.role, Arc::clone(&attestation)).await? {
                Ok(outcome) => return Ok(Some(outcome)),
                Err(e) if is_retryable(&e) => {
                    EngineCounters::bump(&self.counters.storage_faults);
                    warn!(
                        chain = %self.role,
                        tx_id = %attestation.transaction_id,
                        claim = %attestation.claim_key,
                        error = %e,
                        retry_in_ms = self.ctx.retry_delay.as_millis() as u64,
                        "Store write failed, will retry"
                    );
                }
                Err(e) => {
                    EngineCounters::bump(&self.counters.storage_faults);
                    error!(
                        chain = %self.role,
                        tx_id = %attestation.transaction_id,
                        error = %e,
                        "Store write failed permanently"
                    );
                    return Err(EngineError::Storage(e));
                }
            }

            let mut stopping = self.shutdown_requested();
            if !stopping {
                tokio::select! {
                    _ = tokio::time::sleep(self.ctx.retry_delay) => {}
                    changed = self.ctx.shutdown.changed() => stopping = changed.is_err(),
                }
                stopping = stopping || self.shutdown_requested();
            }
            if stopping {
                warn!(
                    chain = %self.role,
                    tx_id = %attestation.transaction_id,
                    "Shutdown during retry; event left for redelivery"
                );
                return Ok(None);
            }
        }
    }

}

/// One write transaction: conditional insert followed by the checkpoint
/// advance. The outer result reports a failed blocking task.
///
/// Takes owned handles so the engine itself is never borrowed across the
/// blocking task; feeds only need to be `Send`.
async fn commit(
    store: Arc<AttestationStore>,
    role: ChainRole,
    attestation: Arc<Attestation>,
) -> Result<Result<InsertOutcome, StoreError>, EngineError> {
    tokio::task::spawn_blocking(move || {
        store.write(|w| {
            let outcome = match attestation.claim_key {
                ClaimKey::Claim(_) => w.try_insert_claim(&attestation)?,
                ClaimKey::CreateAccount(_) => w.try_insert_account_create(&attestation)?,
            };
            w.advance_sync_state(role, &attestation.transaction_id, attestation.ledger_sequence)?;
            Ok(outcome)
        })
    })
    .await
    .map_err(|e| EngineError::Task(e.to_string()))
}

/// Faults worth retrying: the database or the disk may recover.
fn is_retryable(error: &StoreError) -> bool {
    matches!(error, StoreError::DatabaseError(_) | StoreError::IoError(_))
}
