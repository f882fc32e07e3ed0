//! Bridge descriptor

use crate::amount::{AccountId, Issue};
use crate::chain::{ChainRole, Direction};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one bridge instance: the door account and the bridged asset
/// on each chain role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeDescriptor {
    pub locking_chain_door: AccountId,
    pub locking_chain_issue: Issue,
    pub issuing_chain_door: AccountId,
    pub issuing_chain_issue: Issue,
}

impl BridgeDescriptor {
    /// Build and validate a descriptor.
    pub fn new(
        locking_chain_door: AccountId,
        locking_chain_issue: Issue,
        issuing_chain_door: AccountId,
        issuing_chain_issue: Issue,
    ) -> Result<Self> {
        let bridge = Self {
            locking_chain_door,
            locking_chain_issue,
            issuing_chain_door,
            issuing_chain_issue,
        };
        bridge.validate()?;
        Ok(bridge)
    }

    /// Structural checks on a descriptor that arrived through serde.
    pub fn validate(&self) -> Result<()> {
        if self.locking_chain_door == self.issuing_chain_door {
            return Err(CoreError::InvalidBridge(format!(
                "both chains use door {}",
                self.locking_chain_door
            )));
        }
        if self.locking_chain_issue.is_native() != self.issuing_chain_issue.is_native() {
            return Err(CoreError::InvalidBridge(
                "native assets can only be bridged to native assets".to_string(),
            ));
        }
        Ok(())
    }

    /// Door account on `role`.
    pub fn door(&self, role: ChainRole) -> &AccountId {
        match role {
            ChainRole::Locking => &self.locking_chain_door,
            ChainRole::Issuing => &self.issuing_chain_door,
        }
    }

    /// Bridged asset on `role`.
    pub fn issue(&self, role: ChainRole) -> &Issue {
        match role {
            ChainRole::Locking => &self.locking_chain_issue,
            ChainRole::Issuing => &self.issuing_chain_issue,
        }
    }

    /// Which role `account` is the door of, if any.
    pub fn role_of_door(&self, account: &AccountId) -> Option<ChainRole> {
        ChainRole::ALL
            .into_iter()
            .find(|role| self.door(*role) == account)
    }

    /// Direction of a transfer whose source door is `door`.
    ///
    /// A door matching neither side yields `None`.
    pub fn direction_from_source_door(&self, door: &AccountId) -> Option<Direction> {
        self.role_of_door(door).map(Direction::from_source)
    }

    /// Direction of a transfer whose destination door is `door`.
    pub fn direction_from_destination_door(&self, door: &AccountId) -> Option<Direction> {
        self.role_of_door(door).map(Direction::from_destination)
    }
}

impl fmt::Display for BridgeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} <-> {}:{}",
            self.locking_chain_door,
            self.locking_chain_issue,
            self.issuing_chain_door,
            self.issuing_chain_issue
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn native_bridge() -> BridgeDescriptor {
        BridgeDescriptor::new(account("rDoorA"), Issue::Native, account("rDoorB"), Issue::Native)
            .unwrap()
    }

    #[test]
    fn test_rejects_shared_door() {
        let result =
            BridgeDescriptor::new(account("rDoor"), Issue::Native, account("rDoor"), Issue::Native);
        assert!(matches!(result, Err(CoreError::InvalidBridge(_))));
    }

    #[test]
    fn test_rejects_native_to_issued() {
        let issued = Issue::Issued {
            currency: crate::Currency::new("FOO").unwrap(),
            issuer: account("rIssuer"),
        };
        let result = BridgeDescriptor::new(account("rDoorA"), Issue::Native, account("rDoorB"), issued);
        assert!(result.is_err());
    }

    #[test]
    fn test_door_directions() {
        let bridge = native_bridge();
        assert_eq!(
            bridge.direction_from_source_door(&account("rDoorA")),
            Some(Direction::LockingToIssuing)
        );
        assert_eq!(
            bridge.direction_from_source_door(&account("rDoorB")),
            Some(Direction::IssuingToLocking)
        );
        assert_eq!(
            bridge.direction_from_destination_door(&account("rDoorB")),
            Some(Direction::LockingToIssuing)
        );
        assert_eq!(bridge.direction_from_source_door(&account("rOther")), None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::json!({
            "locking_chain_door": "rDoorA",
            "locking_chain_issue": "XRP",
            "issuing_chain_door": "rDoorB",
            "issuing_chain_issue": "XRP"
        });
        let bridge: BridgeDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(bridge, native_bridge());
    }
}
