//! Witness node wiring
//!
//! Builds every long-lived component from a [`NodeConfig`]: the identity, the
//! store (persistent mode), one [`RoleEngine`] per chain role and the request
//! [`Dispatcher`]. All of them share one shutdown channel.

use crate::engine::{EngineContext, EngineCounters, RoleEngine};
use crate::error::{EngineError, NodeError};
use crate::feed::{EventFeed, EventRouter};
use crate::rpc::Dispatcher;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use witness_core::{AttestationStore, ChainRole, NodeConfig, NodeMode};
use witness_crypto::{load_identity, Identity};

/// A configured witness node.
pub struct WitnessNode {
    config: NodeConfig,
    identity: Arc<Identity>,
    store: Option<Arc<AttestationStore>>,
    shutdown: Arc<watch::Sender<bool>>,
    counters: Vec<(ChainRole, Arc<EngineCounters>)>,
    tasks: Vec<(ChainRole, JoinHandle<Result<(), EngineError>>)>,
}

impl WitnessNode {
    /// Decode the configured key and, in persistent mode, open the store.
    ///
    /// Both steps are fatal on failure: a node with unusable key material
    /// or a corrupted store never starts serving.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        let identity = load_identity(&config.signing)?;
        Self::with_identity(config, identity)
    }

    /// Build a node around an already loaded identity.
    pub fn with_identity(config: NodeConfig, identity: Identity) -> Result<Self, NodeError> {
        let store = match config.node.mode {
            NodeMode::Persistent => {
                let store = AttestationStore::open(config.db_path())?;
                for role in ChainRole::ALL {
                    let checkpoint = store.ensure_sync_state(role)?;
                    info!(
                        chain = %role,
                        ledger_seq = checkpoint.last_ledger_sequence,
                        tx_id = ?checkpoint.last_transaction_id,
                        "Resuming from checkpoint"
                    );
                }
                Some(Arc::new(store))
            }
            NodeMode::Stateless => None,
        };

        let (shutdown, _) = watch::channel(false);
        let counters = ChainRole::ALL
            .into_iter()
            .map(|role| (role, Arc::new(EngineCounters::default())))
            .collect();

        info!(
            mode = ?config.node.mode,
            bridge = %config.bridge,
            signing_account = %identity.signing_account(),
            "Witness node ready"
        );

        Ok(Self {
            config,
            identity: Arc::new(identity),
            store,
            shutdown: Arc::new(shutdown),
            counters,
            tasks: Vec::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn identity(&self) -> &Arc<Identity> {
        &self.identity
    }

    /// The attestation store; `None` in stateless mode.
    pub fn store(&self) -> Option<&Arc<AttestationStore>> {
        self.store.as_ref()
    }

    fn counters_for(&self, role: ChainRole) -> Arc<EngineCounters> {
        self.counters
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, c)| Arc::clone(c))
            .unwrap_or_default()
    }

    /// Spawn one role engine per feed.
    pub fn spawn_engines<F>(&mut self, feeds: Vec<(ChainRole, F)>) -> Result<(), NodeError>
    where
        F: EventFeed + 'static,
    {
        let store = self.store.clone().ok_or(NodeError::Stateless)?;
        if !self.tasks.is_empty() {
            return Err(NodeError::AlreadyRunning);
        }

        let ctx = EngineContext {
            identity: Arc::clone(&self.identity),
            store,
            shutdown: self.shutdown.subscribe(),
            retry_delay: self.config.retry_delay(),
        };

        for (role, feed) in feeds {
            let engine = RoleEngine::new(role, feed, ctx.clone(), self.counters_for(role))?;
            self.tasks.push((role, tokio::spawn(engine.run())));
        }
        Ok(())
    }

    /// Spawn both role engines on in-process channels and return the router
    /// feeding them.
    pub fn spawn_channel_engines(&mut self, capacity: usize) -> Result<EventRouter, NodeError> {
        let (router, locking, issuing) = EventRouter::channel(capacity);
        self.spawn_engines(vec![
            (ChainRole::Locking, locking),
            (ChainRole::Issuing, issuing),
        ])?;
        Ok(router)
    }

    /// Request dispatcher matching the node's mode.
    pub fn dispatcher(&self) -> Dispatcher {
        match &self.store {
            Some(store) => Dispatcher::persistent(
                Arc::clone(&self.identity),
                self.config.bridge.clone(),
                Arc::clone(store),
                Arc::clone(&self.shutdown),
                self.counters.clone(),
            ),
            None => Dispatcher::stateless(
                Arc::clone(&self.identity),
                self.config.bridge.clone(),
                Arc::clone(&self.shutdown),
            ),
        }
    }

    /// Receiver that flips to `true` when shutdown is requested.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Ask every engine to stop after its in-flight event.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.send_replace(true);
    }

    /// Wait for every engine to finish.
    ///
    /// All engines are awaited; the first failure is returned.
    pub async fn join(&mut self) -> Result<(), NodeError> {
        let mut first_error = None;
        for (role, task) in self.tasks.drain(..) {
            let result = match task.await {
                Ok(result) => result.map_err(NodeError::from),
                Err(e) => Err(NodeError::Engine(EngineError::Task(e.to_string()))),
            };
            match result {
                Ok(()) => info!(chain = %role, "Engine finished"),
                Err(e) => {
                    error!(chain = %role, error = %e, "Engine failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
