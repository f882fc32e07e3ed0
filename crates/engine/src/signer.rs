//! Stateless signing
//!
//! A deployment without a store signs whatever claim a caller describes.
//! The message is built by the same codec as the persistent engine, so both
//! paths produce combinable signatures for the same logical claim.

use crate::error::QueryError;
use crate::query::validate_bridge;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use witness_core::{AccountId, Amount, BridgeDescriptor, ClaimKey, Direction};
use witness_crypto::{encode, Identity};

/// Result of a stateless sign request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedClaim {
    pub direction: Direction,
    #[serde(with = "hex::serde")]
    pub signing_key: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
    pub signing_account: AccountId,
}

/// Signs caller-described claims without persisting anything.
#[derive(Clone)]
pub struct StatelessSigner {
    identity: Arc<Identity>,
}

impl StatelessSigner {
    pub fn new(identity: Arc<Identity>) -> Self {
        Self { identity }
    }

    /// Sign `key` moving `amount` towards `dst_door`.
    ///
    /// The direction is the one whose destination door is `dst_door`.
    pub fn sign(
        &self,
        dst_door: &AccountId,
        bridge: &BridgeDescriptor,
        amount: &Amount,
        key: ClaimKey,
    ) -> Result<SignedClaim, QueryError> {
        validate_bridge(bridge)?;
        let direction = bridge
            .direction_from_destination_door(dst_door)
            .ok_or_else(|| QueryError::InvalidDirection {
                door: dst_door.clone(),
            })?;

        let message = encode(bridge, amount, key, direction);
        let signature = self.identity.sign(&message);
        debug!(direction = %direction, claim = %key, "Signed claim statelessly");

        Ok(SignedClaim {
            direction,
            signing_key: self.identity.public_key(),
            signature,
            signing_account: self.identity.signing_account().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_core::Issue;

    fn account(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn bridge() -> BridgeDescriptor {
        BridgeDescriptor::new(account("rDA"), Issue::Native, account("rDB"), Issue::Native).unwrap()
    }

    fn signer() -> StatelessSigner {
        StatelessSigner::new(Arc::new(Identity::from_secret(&[3u8; 32], None).unwrap()))
    }

    #[test]
    fn test_direction_from_destination_door() {
        let signer = signer();
        let amount = Amount::native(50);

        let to_issuing = signer
            .sign(&account("rDB"), &bridge(), &amount, ClaimKey::Claim(1))
            .unwrap();
        assert_eq!(to_issuing.direction, Direction::LockingToIssuing);

        let to_locking = signer
            .sign(&account("rDA"), &bridge(), &amount, ClaimKey::Claim(1))
            .unwrap();
        assert_eq!(to_locking.direction, Direction::IssuingToLocking);
        assert_ne!(to_issuing.signature, to_locking.signature);
    }

    #[test]
    fn test_signature_covers_canonical_message() {
        let signer = signer();
        let amount = Amount::native(50);
        let signed = signer
            .sign(&account("rDB"), &bridge(), &amount, ClaimKey::CreateAccount(4))
            .unwrap();

        let message = encode(
            &bridge(),
            &amount,
            ClaimKey::CreateAccount(4),
            Direction::LockingToIssuing,
        );
        assert!(witness_crypto::verify(&signed.signing_key, &message, &signed.signature).unwrap());
    }

    #[test]
    fn test_unknown_door_rejected() {
        let result = signer().sign(
            &account("rElsewhere"),
            &bridge(),
            &Amount::native(1),
            ClaimKey::Claim(1),
        );
        assert!(matches!(result, Err(QueryError::InvalidDirection { .. })));
    }
}
