//! Signed attestation records

use crate::amount::{AccountId, Amount};
use crate::bridge::BridgeDescriptor;
use crate::chain::Direction;
use crate::event::{ChainEvent, ClaimKey};
use serde::{Deserialize, Serialize};

/// A witness signature over the canonical encoding of a claim or account
/// creation, together with the descriptive fields of the observed event.
///
/// Attestations are written once and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub direction: Direction,
    pub claim_key: ClaimKey,
    pub transaction_id: String,
    pub ledger_sequence: u32,
    pub success: bool,
    pub delivered_amount: Amount,
    /// Present on account creations only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<Amount>,
    pub bridge: BridgeDescriptor,
    pub sending_account: AccountId,
    pub reward_account: AccountId,
    pub other_chain_destination: Option<AccountId>,
    pub signing_account: AccountId,
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl Attestation {
    /// Pair an observed event with the signature produced for it.
    pub fn from_event(
        event: &ChainEvent,
        signing_account: AccountId,
        public_key: Vec<u8>,
        signature: Vec<u8>,
    ) -> Self {
        let (reward_amount, sending_account, reward_account, destination, success) = match event {
            ChainEvent::Claim(e) => (
                None,
                e.sending_account.clone(),
                e.reward_account.clone(),
                e.other_chain_destination.clone(),
                e.success,
            ),
            ChainEvent::CreateAccount(e) => (
                Some(e.reward_amount.clone()),
                e.sending_account.clone(),
                e.reward_account.clone(),
                Some(e.other_chain_destination.clone()),
                e.success,
            ),
        };

        Self {
            direction: event.direction(),
            claim_key: event.claim_key(),
            transaction_id: event.transaction_id().to_string(),
            ledger_sequence: event.ledger_sequence(),
            success,
            delivered_amount: event.delivered_amount().clone(),
            reward_amount,
            bridge: event.bridge().clone(),
            sending_account,
            reward_account,
            other_chain_destination: destination,
            signing_account,
            public_key,
            signature,
        }
    }

    pub fn is_account_create(&self) -> bool {
        matches!(self.claim_key, ClaimKey::CreateAccount(_))
    }
}
