//! Proposal registry: creates proposals and routes votes to them

use ballotbox_core::{
    BallotConfig, BallotError, BallotResult, ProposalId, Tally, Timestamp, VoterId,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::proposal::{Proposal, ProposalState, ProposalStatus};
use crate::snapshot::RegistrySnapshot;

/// Registry of independently locked proposals
///
/// Each proposal sits behind its own mutex, so a vote's checks and update
/// are atomic while votes on different proposals run in parallel.
pub struct ProposalRegistry {
    owner: Option<VoterId>,
    config: BallotConfig,
    next_id: Mutex<ProposalId>,
    proposals: DashMap<ProposalId, Arc<Mutex<Proposal>>>,
}

impl ProposalRegistry {
    pub fn new(owner: Option<VoterId>, config: BallotConfig) -> Self {
        Self {
            owner,
            config,
            next_id: Mutex::new(ProposalId::new(0)),
            proposals: DashMap::new(),
        }
    }

    /// Create a proposal closing at `deadline`.
    ///
    /// Ids are handed out in creation order starting at 0; a rejected
    /// creation does not consume one.
    pub fn create_proposal(
        &self,
        caller: VoterId,
        deadline: Timestamp,
        now: Timestamp,
    ) -> BallotResult<ProposalId> {
        if let Some(owner) = self.owner {
            if caller != owner {
                warn!("Rejected proposal creation from non-owner {}", caller);
                return Err(BallotError::Unauthorized(caller));
            }
        }

        let mut next_id = self.next_id.lock();
        let id = *next_id;
        let proposal = Proposal::create(id, caller, deadline, self.config.max_votes, now)?;

        self.proposals.insert(id, Arc::new(Mutex::new(proposal)));
        *next_id = id.next();

        info!("Created proposal {} (deadline {}, capacity {})", id, deadline, self.config.max_votes);
        Ok(id)
    }

    /// Cast a vote on proposal `id`
    pub fn cast_vote(
        &self,
        id: ProposalId,
        voter: VoterId,
        choice: bool,
        now: Timestamp,
    ) -> BallotResult<Tally> {
        let proposal = self.get(id)?;
        let result = proposal.lock().cast_vote(voter, choice, now);

        if let Err(e) = &result {
            debug!("Vote by {} on proposal {} rejected: {}", voter, id, e);
        }
        result
    }

    pub fn proposal_state(&self, id: ProposalId) -> BallotResult<ProposalState> {
        Ok(self.get(id)?.lock().state())
    }

    pub fn proposal_status(&self, id: ProposalId, now: Timestamp) -> BallotResult<ProposalStatus> {
        Ok(self.get(id)?.lock().status(now))
    }

    /// States of all proposals ordered by id
    pub fn list_states(&self) -> Vec<ProposalState> {
        let mut states: Vec<ProposalState> = self
            .handles()
            .into_iter()
            .map(|proposal| proposal.lock().state())
            .collect();
        states.sort_by_key(|s| s.id);
        states
    }

    pub fn next_proposal_id(&self) -> ProposalId {
        *self.next_id.lock()
    }

    pub fn owner(&self) -> Option<VoterId> {
        self.owner
    }

    pub fn config(&self) -> &BallotConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Capture the full registry state
    pub fn snapshot(&self, taken_at: Timestamp) -> RegistrySnapshot {
        // Holding the counter keeps concurrent creations out of the picture.
        let next_id = self.next_id.lock();

        let mut proposals: Vec<_> = self
            .handles()
            .into_iter()
            .map(|proposal| proposal.lock().to_record())
            .collect();
        proposals.sort_by_key(|r| r.id);

        RegistrySnapshot {
            owner: self.owner,
            next_proposal_id: *next_id,
            proposals,
            taken_at,
        }
    }

    /// Rebuild a registry from a snapshot.
    ///
    /// The owner comes from the snapshot; ballot rules for new proposals
    /// come from `config`. Existing proposals keep their own capacity.
    pub fn from_snapshot(snapshot: RegistrySnapshot, config: BallotConfig) -> BallotResult<Self> {
        config.validate()?;
        snapshot.verify()?;

        let registry = Self::new(snapshot.owner, config);
        *registry.next_id.lock() = snapshot.next_proposal_id;

        for record in snapshot.proposals {
            let proposal = Proposal::from_record(record)?;
            registry
                .proposals
                .insert(proposal.id(), Arc::new(Mutex::new(proposal)));
        }

        info!(
            "Restored {} proposals, next id {}",
            registry.len(),
            snapshot.next_proposal_id
        );
        Ok(registry)
    }

    fn get(&self, id: ProposalId) -> BallotResult<Arc<Mutex<Proposal>>> {
        self.proposals
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(BallotError::ProposalNotFound(id))
    }

    // Collect handles first so no shard lock is held while a proposal is locked.
    fn handles(&self) -> Vec<Arc<Mutex<Proposal>>> {
        self.proposals
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// Shared registry type
pub type SharedRegistry = Arc<ProposalRegistry>;
