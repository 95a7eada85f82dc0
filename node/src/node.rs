//! Full node implementation

use crate::api::start_api_server;
use crate::runtime::NodeRuntime;
use crate::store::FileSnapshotStore;
use ballotbox_core::{BallotResult, NodeConfig, SystemClock, VoterId};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Full BALLOTBOX node
pub struct BallotNode {
    runtime: Arc<NodeRuntime>,
}

impl BallotNode {
    /// Open a node, restoring proposals from the configured snapshot file
    pub async fn open(config: NodeConfig) -> BallotResult<Self> {
        let store = Arc::new(FileSnapshotStore::new(config.snapshot_path()));
        let runtime = NodeRuntime::open(config, Arc::new(SystemClock), store).await?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    /// Start the node
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Starting BALLOTBOX node '{}'...", self.runtime.config().name);

        let api_handle = if self.runtime.config().api.enabled {
            let api_runtime = self.runtime.clone();
            let api_addr = self.runtime.config().api.listen_addr.clone();

            Some(tokio::spawn(async move {
                if let Err(e) = start_api_server(api_runtime, &api_addr).await {
                    error!("API server error: {}", e);
                }
            }))
        } else {
            info!("HTTP API disabled");
            None
        };

        info!("Node started successfully");
        info!("Proposals loaded: {}", self.runtime.registry().len());
        if let Some(owner) = self.runtime.registry().owner() {
            info!("Proposal creation restricted to {}", owner);
        }

        // Wait for shutdown signal
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping node...");
            }
            Err(e) => {
                error!("Error waiting for shutdown signal: {}", e);
            }
        }

        // Cleanup
        if let Some(handle) = api_handle {
            handle.abort();
        }

        if self.runtime.config().storage.persist_on_shutdown {
            self.runtime.persist().await?;
        }

        info!("Node stopped");

        Ok(())
    }

    /// Get runtime reference
    pub fn runtime(&self) -> &Arc<NodeRuntime> {
        &self.runtime
    }
}

/// Node builder for easier configuration
pub struct NodeBuilder {
    config: NodeConfig,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
        }
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_addr(mut self, addr: &str) -> Self {
        self.config.api.listen_addr = addr.to_string();
        self
    }

    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.config.data_dir = dir;
        self
    }

    pub fn max_votes(mut self, max_votes: u32) -> Self {
        self.config.ballot.max_votes = max_votes;
        self
    }

    pub fn owner(mut self, owner: VoterId) -> Self {
        self.config.owner = Some(owner.to_hex());
        self
    }

    pub fn build_config(self) -> NodeConfig {
        self.config
    }

    pub async fn build(self) -> BallotResult<BallotNode> {
        BallotNode::open(self.config).await
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
