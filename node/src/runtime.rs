//! Node runtime combining registry, clock and snapshot store

use ballotbox_core::{
    BallotResult, Clock, NodeConfig, ProposalId, Tally, Timestamp, VoterId,
};
use ballotbox_ledger::{
    ProposalRegistry, ProposalState, ProposalStatus, SharedRegistry, SnapshotStore,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Node runtime managing all components
pub struct NodeRuntime {
    config: NodeConfig,
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SnapshotStore>,
    started_at: Timestamp,
}

impl NodeRuntime {
    /// Create a runtime, restoring the registry from `store` when it holds
    /// a snapshot.
    pub async fn open(
        config: NodeConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SnapshotStore>,
    ) -> BallotResult<Self> {
        config.validate()?;
        let owner = config.owner_id()?;

        let registry = match store.load().await? {
            Some(mut snapshot) => {
                if snapshot.owner != owner {
                    warn!(
                        "Snapshot owner {:?} differs from configured owner {:?}; using configured owner",
                        snapshot.owner, owner
                    );
                    snapshot.owner = owner;
                }
                ProposalRegistry::from_snapshot(snapshot, config.ballot.clone())?
            }
            None => ProposalRegistry::new(owner, config.ballot.clone()),
        };

        let started_at = clock.now();
        info!(
            "Runtime ready: {} proposals, capacity {} votes each",
            registry.len(),
            config.ballot.max_votes
        );

        Ok(Self {
            config,
            registry: Arc::new(registry),
            clock,
            store,
            started_at,
        })
    }

    /// Create a proposal with the current time as reference
    pub fn create_proposal(&self, caller: VoterId, deadline: Timestamp) -> BallotResult<ProposalId> {
        self.registry.create_proposal(caller, deadline, self.clock.now())
    }

    /// Cast a vote at the current time
    pub fn cast_vote(&self, id: ProposalId, voter: VoterId, choice: bool) -> BallotResult<Tally> {
        self.registry.cast_vote(id, voter, choice, self.clock.now())
    }

    /// State and status of one proposal
    pub fn proposal(&self, id: ProposalId) -> BallotResult<(ProposalState, ProposalStatus)> {
        let now = self.clock.now();
        let state = self.registry.proposal_state(id)?;
        let status = self.registry.proposal_status(id, now)?;
        Ok((state, status))
    }

    /// State and status of every proposal, ordered by id
    pub fn proposals(&self) -> Vec<(ProposalState, ProposalStatus)> {
        let now = self.clock.now();
        self.registry
            .list_states()
            .into_iter()
            .filter_map(|state| {
                let status = self.registry.proposal_status(state.id, now).ok()?;
                Some((state, status))
            })
            .collect()
    }

    /// Write a snapshot of the registry to the store
    pub async fn persist(&self) -> BallotResult<()> {
        let snapshot = self.registry.snapshot(self.clock.now());
        self.store.save(&snapshot).await
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
}
