//! Request dispatcher
//!
//! Maps JSON requests of the form `{"method": ..., "params": {...}}` to
//! structured responses. The transport that carries them is not part of the
//! witness; the node binary feeds the dispatcher from stdin.
//!
//! | method                   | mode       | params                                                      |
//! |--------------------------|------------|-------------------------------------------------------------|
//! | `witness`                | persistent | `bridge_descriptor, amount, sequence_number, door_account`  |
//! | `witness_account_create` | persistent | `bridge_descriptor, create_count, door_account`             |
//! | `sign`                   | stateless  | `dst_door, bridge_descriptor, amount, sequence_number, create_account?` |
//! | `server_info`            | both       |                                                             |
//! | `stop`                   | both       |                                                             |

use crate::engine::{EngineCounters, EngineMetrics};
use crate::error::QueryError;
use crate::query::QueryService;
use crate::signer::StatelessSigner;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use witness_core::{
    AccountId, Amount, Attestation, AttestationStore, BridgeDescriptor, ChainRole,
    ChainSyncState, ClaimKey, Direction, NodeMode, StoreMetrics,
};
use witness_crypto::{Identity, IdentityMetrics};

/// An incoming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Outcome of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { result: Value },
    /// The request was valid but nothing has been attested for it
    NotFound,
    InvalidField { field: String, message: String },
    Error { message: String },
}

impl Response {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Response::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    fn success<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(result) => Response::Success { result },
            Err(e) => Response::error(format!("failed to encode result: {}", e)),
        }
    }

    fn from_query_error(error: QueryError, door_field: &str) -> Self {
        match error {
            QueryError::InvalidDirection { .. } => Response::invalid(door_field, error.to_string()),
            QueryError::InvalidField { field, reason } => Response::InvalidField {
                field,
                message: reason,
            },
            QueryError::Storage(e) => Response::error(e.to_string()),
        }
    }
}

/// Attestation as served to callers, binary values hex encoded.
#[derive(Debug, Serialize)]
struct AttestationView<'a> {
    signing_key: String,
    signature: String,
    amount: &'a Amount,
    bridge_descriptor: &'a BridgeDescriptor,
    direction: Direction,
    sequence_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reward_amount: Option<&'a Amount>,
    transaction_id: &'a str,
    ledger_sequence: u32,
    sending_account: &'a AccountId,
    reward_account: &'a AccountId,
    destination: Option<&'a AccountId>,
    success: bool,
    signing_account: &'a AccountId,
}

impl<'a> From<&'a Attestation> for AttestationView<'a> {
    fn from(a: &'a Attestation) -> Self {
        Self {
            signing_key: hex::encode(&a.public_key),
            signature: hex::encode(&a.signature),
            amount: &a.delivered_amount,
            bridge_descriptor: &a.bridge,
            direction: a.direction,
            sequence_number: a.claim_key.value(),
            reward_amount: a.reward_amount.as_ref(),
            transaction_id: &a.transaction_id,
            ledger_sequence: a.ledger_sequence,
            sending_account: &a.sending_account,
            reward_account: &a.reward_account,
            destination: a.other_chain_destination.as_ref(),
            success: a.success,
            signing_account: &a.signing_account,
        }
    }
}

#[derive(Debug, Serialize)]
struct ServerInfo<'a> {
    version: &'static str,
    mode: NodeMode,
    public_key: String,
    key_id: &'a str,
    signing_account: &'a AccountId,
    bridge: &'a BridgeDescriptor,
    checkpoints: Vec<ChainSyncState>,
    engines: BTreeMap<&'static str, EngineMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<StoreMetrics>,
    signing: IdentityMetrics,
}

enum Backend {
    Persistent {
        query: QueryService,
        store: Arc<AttestationStore>,
    },
    Stateless {
        signer: StatelessSigner,
    },
}

/// Routes requests to the query service or the stateless signer.
pub struct Dispatcher {
    backend: Backend,
    identity: Arc<Identity>,
    bridge: BridgeDescriptor,
    shutdown: Arc<watch::Sender<bool>>,
    engines: Vec<(ChainRole, Arc<EngineCounters>)>,
}

impl Dispatcher {
    /// Dispatcher for a node that persists attestations.
    pub fn persistent(
        identity: Arc<Identity>,
        bridge: BridgeDescriptor,
        store: Arc<AttestationStore>,
        shutdown: Arc<watch::Sender<bool>>,
        engines: Vec<(ChainRole, Arc<EngineCounters>)>,
    ) -> Self {
        Self {
            backend: Backend::Persistent {
                query: QueryService::new(Arc::clone(&store)),
                store,
            },
            identity,
            bridge,
            shutdown,
            engines,
        }
    }

    /// Dispatcher for a node that signs on request without a store.
    pub fn stateless(
        identity: Arc<Identity>,
        bridge: BridgeDescriptor,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> Self {
        Self {
            backend: Backend::Stateless {
                signer: StatelessSigner::new(Arc::clone(&identity)),
            },
            identity,
            bridge,
            shutdown,
            engines: Vec::new(),
        }
    }

    pub fn mode(&self) -> NodeMode {
        match self.backend {
            Backend::Persistent { .. } => NodeMode::Persistent,
            Backend::Stateless { .. } => NodeMode::Stateless,
        }
    }

    /// Handle one serialized request and serialize the response.
    pub fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_value(value),
            Err(e) => Response::error(format!("malformed request: {}", e)),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","message":"failed to encode response: {}"}}"#, e)
        })
    }

    /// Handle a request that has not been shape-checked yet.
    pub fn handle_value(&self, value: Value) -> Response {
        match serde_json::from_value::<Request>(value) {
            Ok(request) => self.handle(&request),
            Err(e) => Response::invalid("method", e.to_string()),
        }
    }

    pub fn handle(&self, request: &Request) -> Response {
        let params = &request.params;
        let response = match (request.method.as_str(), &self.backend) {
            ("witness", Backend::Persistent { query, .. }) => Self::witness(query, params),
            ("witness_account_create", Backend::Persistent { query, .. }) => {
                Self::witness_account_create(query, params)
            }
            ("sign", Backend::Stateless { signer }) => Self::sign(signer, params),
            ("server_info", _) => self.server_info(),
            ("stop", _) => self.stop(),
            ("witness" | "witness_account_create" | "sign", _) => Response::error(format!(
                "{} is not available in {:?} mode",
                request.method,
                self.mode()
            )),
            (other, _) => Response::invalid("method", format!("unknown method {}", other)),
        };

        if let Response::Error { message } = &response {
            warn!(method = %request.method, %message, "Request failed");
        }
        response
    }

    fn witness(query: &QueryService, params: &Value) -> Response {
        let parsed = (|| {
            Ok::<_, Response>((
                bridge_param(params)?,
                param::<Amount>(params, "amount")?,
                sequence_param(params, "sequence_number")?,
                param::<AccountId>(params, "door_account")?,
            ))
        })();
        let (bridge, amount, sequence, door) = match parsed {
            Ok(parsed) => parsed,
            Err(response) => return response,
        };

        match query.witness(&bridge, &amount, sequence, &door) {
            Ok(Some(attestation)) => Response::success(&AttestationView::from(&attestation)),
            Ok(None) => Response::NotFound,
            Err(e) => Response::from_query_error(e, "door_account"),
        }
    }

    fn witness_account_create(query: &QueryService, params: &Value) -> Response {
        let parsed = (|| {
            Ok::<_, Response>((
                bridge_param(params)?,
                sequence_param(params, "create_count")?,
                param::<AccountId>(params, "door_account")?,
            ))
        })();
        let (bridge, count, door) = match parsed {
            Ok(parsed) => parsed,
            Err(response) => return response,
        };

        match query.witness_account_create(&bridge, count, &door) {
            Ok(Some(attestation)) => Response::success(&AttestationView::from(&attestation)),
            Ok(None) => Response::NotFound,
            Err(e) => Response::from_query_error(e, "door_account"),
        }
    }

    fn sign(signer: &StatelessSigner, params: &Value) -> Response {
        let parsed = (|| {
            let sequence = sequence_param(params, "sequence_number")?;
            let create_account = match params.get("create_account") {
                None | Some(Value::Null) => false,
                Some(_) => param::<bool>(params, "create_account")?,
            };
            let key = if create_account {
                ClaimKey::CreateAccount(sequence)
            } else {
                ClaimKey::Claim(sequence)
            };
            Ok::<_, Response>((
                param::<AccountId>(params, "dst_door")?,
                bridge_param(params)?,
                param::<Amount>(params, "amount")?,
                key,
            ))
        })();
        let (dst_door, bridge, amount, key) = match parsed {
            Ok(parsed) => parsed,
            Err(response) => return response,
        };

        match signer.sign(&dst_door, &bridge, &amount, key) {
            Ok(signed) => Response::success(&signed),
            Err(e) => Response::from_query_error(e, "dst_door"),
        }
    }

    fn server_info(&self) -> Response {
        let (checkpoints, store_metrics) = match &self.backend {
            Backend::Persistent { store, .. } => {
                let mut checkpoints = Vec::with_capacity(ChainRole::ALL.len());
                for role in ChainRole::ALL {
                    match store.get_sync_state(role) {
                        Ok(Some(state)) => checkpoints.push(state),
                        Ok(None) => {}
                        Err(e) => return Response::error(e.to_string()),
                    }
                }
                (checkpoints, Some(store.metrics()))
            }
            Backend::Stateless { .. } => (Vec::new(), None),
        };

        let info = ServerInfo {
            version: env!("CARGO_PKG_VERSION"),
            mode: self.mode(),
            public_key: hex::encode(self.identity.public_key()),
            key_id: self.identity.key_id(),
            signing_account: self.identity.signing_account(),
            bridge: &self.bridge,
            checkpoints,
            engines: self
                .engines
                .iter()
                .map(|(role, counters)| (role.as_str(), counters.snapshot()))
                .collect(),
            store: store_metrics,
            signing: self.identity.metrics(),
        };
        Response::success(&info)
    }

    fn stop(&self) -> Response {
        info!("Stop requested");
        self.shutdown.send_replace(true);
        Response::success(&serde_json::json!({ "message": "shutting down" }))
    }
}

fn param<T: DeserializeOwned>(params: &Value, name: &str) -> Result<T, Response> {
    let value = params
        .get(name)
        .ok_or_else(|| Response::invalid(name, "missing"))?;
    serde_json::from_value(value.clone()).map_err(|e| Response::invalid(name, e.to_string()))
}

fn bridge_param(params: &Value) -> Result<BridgeDescriptor, Response> {
    let bridge: BridgeDescriptor = param(params, "bridge_descriptor")?;
    bridge
        .validate()
        .map_err(|e| Response::invalid("bridge_descriptor", e.to_string()))?;
    Ok(bridge)
}

/// Sequence numbers arrive either as JSON integers or as decimal strings.
fn sequence_param(params: &Value, name: &str) -> Result<u64, Response> {
    match params.get(name) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| Response::invalid(name, "must be a non-negative integer")),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| Response::invalid(name, "must be a non-negative integer")),
        Some(_) => Err(Response::invalid(name, "must be a non-negative integer")),
        None => Err(Response::invalid(name, "missing")),
    }
}
