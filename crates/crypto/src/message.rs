//! Canonical attestation message
//!
//! Builds the exact byte string a witness signs for a claim or account
//! creation. Independent witnesses must produce byte-identical messages for
//! their signatures to combine into one threshold proof, so the encoding is
//! a pure function of the logical claim:
//!
//! ```text
//! version:u8 | kind:u8 | bridge | amount | key:u64 | direction:u8
//! ```
//!
//! All integers are big-endian. Strings are `len:u16 || utf8`. An issue is
//! `0x00` (native) or `0x01 || currency || issuer`. An amount is
//! `0x00 || drops:u64` or `0x01 || mantissa:i64 || exponent:i32 || currency || issuer`.
//! The bridge is `locking door || locking issue || issuing door || issuing issue`.

use witness_core::{AccountId, Amount, BridgeDescriptor, Direction, Issue};
use witness_core::ClaimKey;

/// Version byte leading every message.
pub const MESSAGE_VERSION: u8 = 1;

const TAG_NATIVE: u8 = 0;
const TAG_ISSUED: u8 = 1;

/// Encode the canonical message for `key` moving `amount` over `bridge` in
/// `direction`.
pub fn encode(
    bridge: &BridgeDescriptor,
    amount: &Amount,
    key: ClaimKey,
    direction: Direction,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(160);
    out.push(MESSAGE_VERSION);
    out.push(key.wire_tag());
    put_bridge(&mut out, bridge);
    put_amount(&mut out, amount);
    out.extend_from_slice(&key.value().to_be_bytes());
    out.push(direction.wire_tag());
    out
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    // Accounts are capped at 128 bytes and currencies at 40, so the length
    // always fits.
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn put_account(out: &mut Vec<u8>, account: &AccountId) {
    put_str(out, account.as_str());
}

fn put_issue(out: &mut Vec<u8>, issue: &Issue) {
    match issue {
        Issue::Native => out.push(TAG_NATIVE),
        Issue::Issued { currency, issuer } => {
            out.push(TAG_ISSUED);
            put_str(out, currency.as_str());
            put_account(out, issuer);
        }
    }
}

fn put_bridge(out: &mut Vec<u8>, bridge: &BridgeDescriptor) {
    put_account(out, &bridge.locking_chain_door);
    put_issue(out, &bridge.locking_chain_issue);
    put_account(out, &bridge.issuing_chain_door);
    put_issue(out, &bridge.issuing_chain_issue);
}

fn put_amount(out: &mut Vec<u8>, amount: &Amount) {
    match amount {
        Amount::Native { drops } => {
            out.push(TAG_NATIVE);
            out.extend_from_slice(&drops.to_be_bytes());
        }
        Amount::Issued {
            value,
            currency,
            issuer,
        } => {
            out.push(TAG_ISSUED);
            out.extend_from_slice(&value.mantissa().to_be_bytes());
            out.extend_from_slice(&value.exponent().to_be_bytes());
            put_str(out, currency.as_str());
            put_account(out, issuer);
        }
    }
}
