//! Configuration management for the witness node.
//!
//! The node is configured from a single TOML file:
//!
//! ```toml
//! [node]
//! db_path = "/var/lib/witness/attestations.db"
//! log_format = "json"
//! retry_delay_ms = 1000
//! mode = "persistent"
//!
//! [signing]
//! key = "sEdTM1uX8pu2do5XvTnutH6HsouMaM2"
//! signing_account = "rWitness"
//!
//! [bridge]
//! locking_chain_door = "rDoorA"
//! locking_chain_issue = "XRP"
//! issuing_chain_door = "rDoorB"
//! issuing_chain_issue = "XRP"
//! ```

use crate::amount::AccountId;
use crate::bridge::BridgeDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[cfg(feature = "toml")]
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Deployment mode of the node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMode {
    /// Observe chains, persist attestations and serve them
    #[default]
    Persistent,
    /// Sign requests directly, without a store
    Stateless,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub mode: NodeMode,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_format: LogFormat::default(),
            retry_delay_ms: default_retry_delay_ms(),
            mode: NodeMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningSection {
    /// Secret key or seed, in any supported encoding
    pub key: String,
    /// Account the node attests for; derived from the key when absent
    #[serde(default)]
    pub signing_account: Option<AccountId>,
}

/// Complete node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    pub signing: SigningSection,
    pub bridge: BridgeDescriptor,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("witness.db")
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl NodeConfig {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bridge
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if self.signing.key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "signing.key must not be empty".to_string(),
            ));
        }
        if self.node.mode == NodeMode::Persistent && self.node.db_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "node.db_path is required in persistent mode".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.node.retry_delay_ms)
    }

    pub fn db_path(&self) -> &Path {
        &self.node.db_path
    }
}

#[cfg(all(test, feature = "toml"))]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [node]
        db_path = "/tmp/witness.db"
        log_format = "json"

        [signing]
        key = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff"
        signing_account = "rWitness"

        [bridge]
        locking_chain_door = "rDoorA"
        locking_chain_issue = "XRP"
        issuing_chain_door = "rDoorB"
        issuing_chain_issue = "XRP"
    "#;

    #[test]
    fn test_parse_sample() {
        let config = NodeConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.node.log_format, LogFormat::Json);
        assert_eq!(config.node.mode, NodeMode::Persistent);
        assert_eq!(config.retry_delay(), Duration::from_millis(1_000));
        assert_eq!(config.bridge.locking_chain_door.as_str(), "rDoorA");
        assert_eq!(
            config.signing.signing_account.as_ref().map(|a| a.as_str()),
            Some("rWitness")
        );
    }

    #[test]
    fn test_rejects_shared_doors() {
        let content = SAMPLE.replace("rDoorB", "rDoorA");
        let result = NodeConfig::from_toml_str(&content);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let content = SAMPLE.replace("log_format", "log_colour");
        assert!(matches!(
            NodeConfig::from_toml_str(&content),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_issued_bridge() {
        let content = SAMPLE
            .replace(
                "locking_chain_issue = \"XRP\"",
                "locking_chain_issue = { currency = \"FOO\", issuer = \"rIssuer\" }",
            )
            .replace(
                "issuing_chain_issue = \"XRP\"",
                "issuing_chain_issue = { currency = \"FOO\", issuer = \"rDoorB\" }",
            );
        let config = NodeConfig::from_toml_str(&content).unwrap();
        assert!(!config.bridge.locking_chain_issue.is_native());
    }
}
