//! Attestation engine, query path and node wiring for the bridge witness.
//!
//! - [`RoleEngine`]: per-role loop turning finalized events into stored
//!   attestations
//! - [`QueryService`]: read-only lookups for callers assembling a proof
//! - [`StatelessSigner`]: signing without a store
//! - [`Dispatcher`]: JSON request handling on top of both
//! - [`WitnessNode`]: builds and runs everything from a `NodeConfig`

pub mod engine;
pub mod error;
pub mod feed;
pub mod node;
pub mod query;
pub mod rpc;
pub mod signer;

pub use engine::{EngineContext, EngineCounters, EngineMetrics, EngineState, RoleEngine};
pub use error::{EngineError, NodeError, QueryError};
pub use feed::{EventFeed, EventRouter, FeedClosed};
pub use node::WitnessNode;
pub use query::{resolve_direction, QueryService};
pub use rpc::{Dispatcher, Request, Response};
pub use signer::{SignedClaim, StatelessSigner};
