//! Bounded set of voters that have cast a vote

use ballotbox_core::VoterId;
use std::collections::HashSet;

/// Largest up-front allocation; bigger sets grow on demand
const PREALLOCATE_LIMIT: usize = 1024;

/// Outcome of [`VoterSet::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Full,
    AlreadyVoted,
}

/// Voter membership with a hard capacity
///
/// Membership is permanent: there is no removal.
#[derive(Debug, Clone)]
pub struct VoterSet {
    voters: HashSet<VoterId>,
    capacity: usize,
}

impl VoterSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            voters: HashSet::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    /// Add a voter. Capacity is checked before membership.
    pub fn insert(&mut self, voter: VoterId) -> Admission {
        if self.is_full() {
            return Admission::Full;
        }
        if !self.voters.insert(voter) {
            return Admission::AlreadyVoted;
        }
        Admission::Admitted
    }

    pub fn contains(&self, voter: &VoterId) -> bool {
        self.voters.contains(voter)
    }

    pub fn is_full(&self) -> bool {
        self.voters.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Voters in a stable order
    pub fn sorted(&self) -> Vec<VoterId> {
        let mut voters: Vec<VoterId> = self.voters.iter().copied().collect();
        voters.sort();
        voters
    }
}
