//! Chain roles and transfer directions.
//!
//! A bridge joins two ledgers. The *locking* chain holds the original asset
//! and the *issuing* chain mints its wrapped counterpart; both are symmetric
//! as far as witnessing is concerned. Every transfer moves from one role to
//! the other, which gives exactly two directions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two ledgers participating in a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainRole {
    /// Chain A
    Locking,
    /// Chain B
    Issuing,
}

impl ChainRole {
    /// Both roles, locking first.
    pub const ALL: [ChainRole; 2] = [ChainRole::Locking, ChainRole::Issuing];

    /// The opposite role.
    pub fn other(self) -> Self {
        match self {
            ChainRole::Locking => ChainRole::Issuing,
            ChainRole::Issuing => ChainRole::Locking,
        }
    }

    /// Stable name used for storage rows and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ChainRole::Locking => "locking",
            ChainRole::Issuing => "issuing",
        }
    }

    /// Inverse of [`ChainRole::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "locking" => Some(ChainRole::Locking),
            "issuing" => Some(ChainRole::Issuing),
            _ => None,
        }
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a cross-chain transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LockingToIssuing,
    IssuingToLocking,
}

impl Direction {
    /// Both directions.
    pub const ALL: [Direction; 2] = [Direction::LockingToIssuing, Direction::IssuingToLocking];

    /// Direction of a transfer observed on `source`.
    pub fn from_source(source: ChainRole) -> Self {
        match source {
            ChainRole::Locking => Direction::LockingToIssuing,
            ChainRole::Issuing => Direction::IssuingToLocking,
        }
    }

    /// Direction of a transfer that lands on `destination`.
    pub fn from_destination(destination: ChainRole) -> Self {
        Self::from_source(destination.other())
    }

    pub fn source(self) -> ChainRole {
        match self {
            Direction::LockingToIssuing => ChainRole::Locking,
            Direction::IssuingToLocking => ChainRole::Issuing,
        }
    }

    pub fn destination(self) -> ChainRole {
        self.source().other()
    }

    pub fn reverse(self) -> Self {
        Self::from_source(self.destination())
    }

    /// Single-byte tag used by the message codec.
    pub fn wire_tag(self) -> u8 {
        match self {
            Direction::LockingToIssuing => 0,
            Direction::IssuingToLocking => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::LockingToIssuing => "locking_to_issuing",
            Direction::IssuingToLocking => "issuing_to_locking",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_role_is_involution() {
        for role in ChainRole::ALL {
            assert_ne!(role.other(), role);
            assert_eq!(role.other().other(), role);
        }
    }

    #[test]
    fn test_direction_endpoints() {
        let dir = Direction::from_source(ChainRole::Locking);
        assert_eq!(dir, Direction::LockingToIssuing);
        assert_eq!(dir.source(), ChainRole::Locking);
        assert_eq!(dir.destination(), ChainRole::Issuing);
        assert_eq!(dir.reverse(), Direction::IssuingToLocking);
        assert_eq!(
            Direction::from_destination(ChainRole::Issuing),
            Direction::LockingToIssuing
        );
    }

    #[test]
    fn test_role_names_round_trip() {
        for role in ChainRole::ALL {
            assert_eq!(ChainRole::from_name(role.as_str()), Some(role));
        }
        assert_eq!(ChainRole::from_name("mainnet"), None);
    }
}
