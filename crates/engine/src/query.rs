//! Read path: resolve a caller's claim description into a direction and a
//! store lookup.
//!
//! The caller names the bridge and the door account of the chain the
//! transfer left from. Any door matching neither side of the bridge is
//! rejected before the store is touched.

use crate::error::QueryError;
use std::sync::Arc;
use tracing::debug;
use witness_core::{AccountId, Amount, Attestation, AttestationStore, BridgeDescriptor, Direction};

/// Resolve the transfer direction from the door account a caller supplied.
///
/// The locking door frames the claim as locking-to-issuing and the issuing
/// door as issuing-to-locking.
pub fn resolve_direction(
    bridge: &BridgeDescriptor,
    door_account: &AccountId,
) -> Result<Direction, QueryError> {
    bridge
        .direction_from_source_door(door_account)
        .ok_or_else(|| QueryError::InvalidDirection {
            door: door_account.clone(),
        })
}

/// Read-only lookups against the attestation store.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<AttestationStore>,
}

impl QueryService {
    pub fn new(store: Arc<AttestationStore>) -> Self {
        Self { store }
    }

    /// Attestation for claim `claim_sequence` moving `amount`, or `None` when
    /// it has not been attested (yet).
    pub fn witness(
        &self,
        bridge: &BridgeDescriptor,
        amount: &Amount,
        claim_sequence: u64,
        door_account: &AccountId,
    ) -> Result<Option<Attestation>, QueryError> {
        validate_bridge(bridge)?;
        let direction = resolve_direction(bridge, door_account)?;
        let found = self
            .store
            .lookup_claim(direction, bridge, claim_sequence, amount)?;
        debug!(
            direction = %direction,
            claim_sequence,
            found = found.is_some(),
            "Claim lookup"
        );
        Ok(found)
    }

    /// Attestation for account creation `create_count`.
    pub fn witness_account_create(
        &self,
        bridge: &BridgeDescriptor,
        create_count: u64,
        door_account: &AccountId,
    ) -> Result<Option<Attestation>, QueryError> {
        validate_bridge(bridge)?;
        let direction = resolve_direction(bridge, door_account)?;
        let found = self
            .store
            .lookup_account_create(direction, bridge, create_count)?;
        debug!(
            direction = %direction,
            create_count,
            found = found.is_some(),
            "Account create lookup"
        );
        Ok(found)
    }
}

pub(crate) fn validate_bridge(bridge: &BridgeDescriptor) -> Result<(), QueryError> {
    bridge
        .validate()
        .map_err(|e| QueryError::field("bridge_descriptor", e.to_string()))
}
