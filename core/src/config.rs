//! Configuration types for BALLOTBOX

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BallotError;
use crate::traits::BallotResult;
use crate::types::VoterId;

/// Votes a proposal accepts before it closes
pub const DEFAULT_MAX_VOTES: u32 = 100;

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Only this voter id may create proposals (hex); anyone when unset
    pub owner: Option<String>,

    /// Ballot rules
    pub ballot: BallotConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Snapshot persistence
    pub storage: StorageConfig,

    /// Logging level
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "ballotbox-node".to_string(),
            data_dir: PathBuf::from("./data"),
            owner: None,
            ballot: BallotConfig::default(),
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    pub fn from_json(json: &str) -> BallotResult<Self> {
        let config: NodeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> BallotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> BallotResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BallotError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> BallotResult<()> {
        self.ballot.validate()?;
        self.owner_id()?;
        if self.storage.snapshot_file.as_os_str().is_empty() {
            return Err(BallotError::Config("storage.snapshot_file is empty".into()));
        }
        Ok(())
    }

    /// Parsed `owner`
    pub fn owner_id(&self) -> BallotResult<Option<VoterId>> {
        self.owner
            .as_deref()
            .map(|hex| {
                VoterId::from_hex(hex)
                    .map_err(|e| BallotError::Config(format!("owner: {}", e)))
            })
            .transpose()
    }

    /// Full path of the registry snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.snapshot_file)
    }
}

/// Rules applied to every proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallotConfig {
    /// Capacity of each proposal
    pub max_votes: u32,
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            max_votes: DEFAULT_MAX_VOTES,
        }
    }
}

impl BallotConfig {
    pub fn validate(&self) -> BallotResult<()> {
        if self.max_votes == 0 {
            return Err(BallotError::Config("ballot.max_votes must be positive".into()));
        }
        Ok(())
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Enable HTTP API
    pub enabled: bool,

    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot file name inside `data_dir`
    pub snapshot_file: PathBuf,

    /// Write a snapshot when the node stops
    pub persist_on_shutdown: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_file: PathBuf::from("proposals.snapshot"),
            persist_on_shutdown: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ballot.max_votes, 100);
        assert_eq!(config.snapshot_path(), PathBuf::from("./data/proposals.snapshot"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = NodeConfig::from_json(r#"{"name": "n1", "ballot": {"max_votes": 5}}"#).unwrap();
        assert_eq!(config.name, "n1");
        assert_eq!(config.ballot.max_votes, 5);
        assert_eq!(config.api.listen_addr, "127.0.0.1:8080");
        assert!(config.owner.is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = NodeConfig::from_json(r#"{"ballot": {"max_votes": 0}}"#);
        assert!(matches!(result, Err(BallotError::Config(_))));
    }

    #[test]
    fn test_bad_owner_rejected() {
        let result = NodeConfig::from_json(r#"{"owner": "zz"}"#);
        assert!(matches!(result, Err(BallotError::Config(_))));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");

        let mut config = NodeConfig::default();
        config.owner = Some(VoterId([9u8; 32]).to_hex());
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = NodeConfig::load(&path).unwrap();
        assert_eq!(loaded.owner_id().unwrap(), Some(VoterId([9u8; 32])));
    }

    #[test]
    fn test_load_missing_file() {
        let result = NodeConfig::load(Path::new("/nonexistent/ballotbox.json"));
        assert!(matches!(result, Err(BallotError::Config(_))));
    }
}
