//! Single proposal: yes/no tally, deadline and voter membership

use ballotbox_core::{BallotError, BallotResult, ProposalId, Tally, Timestamp, VoterId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::snapshot::ProposalRecord;
use crate::voters::{Admission, VoterSet};

/// Why a proposal stopped accepting votes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Deadline reached
    Expired,
    /// Capacity reached
    Full,
}

/// Proposal status
///
/// `Closed` is terminal: counts never decrease and time only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Closed(CloseReason),
}

impl ProposalStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ProposalStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Closed(CloseReason::Expired) => "expired",
            ProposalStatus::Closed(CloseReason::Full) => "full",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalState {
    pub id: ProposalId,
    pub creator: VoterId,
    pub deadline: Timestamp,
    pub created_at: Timestamp,
    pub max_votes: u32,
    pub yes_count: u64,
    pub no_count: u64,
}

impl ProposalState {
    pub fn tally(&self) -> Tally {
        Tally::new(self.yes_count, self.no_count)
    }
}

/// A votable yes/no decision
#[derive(Debug, Clone)]
pub struct Proposal {
    id: ProposalId,
    creator: VoterId,
    deadline: Timestamp,
    created_at: Timestamp,
    max_votes: u32,
    tally: Tally,
    voters: VoterSet,
}

impl Proposal {
    /// Create an empty proposal. The deadline must lie strictly after `now`.
    pub fn create(
        id: ProposalId,
        creator: VoterId,
        deadline: Timestamp,
        max_votes: u32,
        now: Timestamp,
    ) -> BallotResult<Self> {
        if deadline <= now {
            return Err(BallotError::InvalidDeadline { deadline, now });
        }
        if max_votes == 0 {
            return Err(BallotError::Config("max_votes must be positive".into()));
        }

        Ok(Self {
            id,
            creator,
            deadline,
            created_at: now,
            max_votes,
            tally: Tally::default(),
            voters: VoterSet::with_capacity(max_votes as usize),
        })
    }

    /// Cast one vote.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// deadline, capacity, then duplicate voter. A rejected vote leaves the
    /// proposal untouched.
    pub fn cast_vote(
        &mut self,
        voter: VoterId,
        choice: bool,
        now: Timestamp,
    ) -> BallotResult<Tally> {
        if now >= self.deadline {
            return Err(BallotError::VotingClosed {
                deadline: self.deadline,
                now,
            });
        }

        match self.voters.insert(voter) {
            Admission::Full => Err(BallotError::CapacityExceeded {
                max_votes: self.max_votes,
            }),
            Admission::AlreadyVoted => Err(BallotError::DuplicateVote(voter)),
            Admission::Admitted => {
                self.tally.record(choice);
                debug!("Proposal {}: {} voted {} ({})", self.id, voter, choice, self.tally);

                if self.voters.is_full() {
                    info!("Proposal {} reached capacity of {} votes", self.id, self.max_votes);
                }
                Ok(self.tally)
            }
        }
    }

    pub fn state(&self) -> ProposalState {
        ProposalState {
            id: self.id,
            creator: self.creator,
            deadline: self.deadline,
            created_at: self.created_at,
            max_votes: self.max_votes,
            yes_count: self.tally.yes_count,
            no_count: self.tally.no_count,
        }
    }

    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        if now >= self.deadline {
            ProposalStatus::Closed(CloseReason::Expired)
        } else if self.voters.is_full() {
            ProposalStatus::Closed(CloseReason::Full)
        } else {
            ProposalStatus::Open
        }
    }

    pub fn id(&self) -> ProposalId {
        self.id
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn has_voted(&self, voter: &VoterId) -> bool {
        self.voters.contains(voter)
    }

    pub fn to_record(&self) -> ProposalRecord {
        ProposalRecord {
            id: self.id,
            creator: self.creator,
            deadline: self.deadline,
            created_at: self.created_at,
            max_votes: self.max_votes,
            yes_count: self.tally.yes_count,
            no_count: self.tally.no_count,
            voters: self.voters.sorted(),
        }
    }

    /// Rebuild from a persisted record, re-checking every invariant
    pub fn from_record(record: ProposalRecord) -> BallotResult<Self> {
        let corrupted = |msg: String| {
            BallotError::SnapshotCorrupted(format!("proposal {}: {}", record.id, msg))
        };

        if record.max_votes == 0 {
            return Err(corrupted("zero capacity".into()));
        }
        if record.voters.len() > record.max_votes as usize {
            return Err(corrupted(format!(
                "{} voters exceed capacity {}",
                record.voters.len(),
                record.max_votes
            )));
        }

        let tally = Tally::new(record.yes_count, record.no_count);
        let total = tally
            .checked_total()
            .filter(|total| *total <= u64::from(record.max_votes))
            .ok_or_else(|| corrupted(format!("tally {} exceeds capacity {}", tally, record.max_votes)))?;
        if total != record.voters.len() as u64 {
            return Err(corrupted(format!(
                "tally {} does not match {} voters",
                tally,
                record.voters.len()
            )));
        }

        let mut voters = VoterSet::with_capacity(record.max_votes as usize);
        for voter in &record.voters {
            if voters.insert(*voter) != Admission::Admitted {
                return Err(corrupted(format!("voter {} listed twice", voter)));
            }
        }

        Ok(Self {
            id: record.id,
            creator: record.creator,
            deadline: record.deadline,
            created_at: record.created_at,
            max_votes: record.max_votes,
            tally,
            voters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn voter(n: u64) -> VoterId {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        VoterId::from_bytes(bytes)
    }

    fn open_proposal(max_votes: u32) -> (Proposal, Timestamp) {
        let now = Timestamp::from_secs(1_700_000_000);
        let proposal = Proposal::create(
            ProposalId::new(123),
            VoterId::ZERO,
            now.saturating_add_millis(HOUR_MS),
            max_votes,
            now,
        )
        .unwrap();
        (proposal, now)
    }

    #[test]
    fn test_starts_empty() {
        let (proposal, now) = open_proposal(100);
        let state = proposal.state();
        assert_eq!(state.id, ProposalId::new(123));
        assert_eq!(state.yes_count, 0);
        assert_eq!(state.no_count, 0);
        assert_eq!(proposal.status(now), ProposalStatus::Open);
    }

    #[test]
    fn test_yes_and_no_counted() {
        let (mut proposal, now) = open_proposal(100);
        assert_eq!(proposal.cast_vote(voter(1), true, now).unwrap(), Tally::new(1, 0));
        assert_eq!(proposal.cast_vote(voter(2), false, now).unwrap(), Tally::new(1, 1));
    }

    #[test]
    fn test_three_yes_two_no() {
        let (mut proposal, now) = open_proposal(100);
        for i in 0..3 {
            proposal.cast_vote(voter(i), true, now).unwrap();
        }
        assert_eq!(proposal.tally(), Tally::new(3, 0));

        for i in 3..5 {
            proposal.cast_vote(voter(i), false, now).unwrap();
        }
        let state = proposal.state();
        assert_eq!((state.yes_count, state.no_count), (3, 2));
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let (mut proposal, now) = open_proposal(100);
        proposal.cast_vote(voter(8), true, now).unwrap();

        let result = proposal.cast_vote(voter(8), false, now);
        assert!(matches!(result, Err(BallotError::DuplicateVote(v)) if v == voter(8)));
        assert_eq!(proposal.tally(), Tally::new(1, 0));
    }

    #[test]
    fn test_capacity_of_one_hundred() {
        let (mut proposal, now) = open_proposal(100);
        for i in 0..100 {
            proposal.cast_vote(voter(i), true, now).unwrap();
        }
        assert_eq!(proposal.tally(), Tally::new(100, 0));
        assert_eq!(proposal.status(now), ProposalStatus::Closed(CloseReason::Full));

        let result = proposal.cast_vote(voter(1000), true, now);
        assert!(matches!(result, Err(BallotError::CapacityExceeded { max_votes: 100 })));
        assert_eq!(proposal.tally(), Tally::new(100, 0));
    }

    #[test]
    fn test_capacity_checked_before_duplicate() {
        let (mut proposal, now) = open_proposal(2);
        proposal.cast_vote(voter(1), true, now).unwrap();
        proposal.cast_vote(voter(2), true, now).unwrap();

        let result = proposal.cast_vote(voter(1), true, now);
        assert!(matches!(result, Err(BallotError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_deadline_checked_first() {
        let (mut proposal, now) = open_proposal(1);
        proposal.cast_vote(voter(1), true, now).unwrap();

        // Full and a duplicate, but the deadline has passed
        let later = proposal.deadline();
        let result = proposal.cast_vote(voter(1), true, later);
        assert!(matches!(result, Err(BallotError::VotingClosed { .. })));
        assert_eq!(proposal.status(later), ProposalStatus::Closed(CloseReason::Expired));
    }

    #[test]
    fn test_vote_at_deadline_rejected() {
        let (mut proposal, _) = open_proposal(100);
        let deadline = proposal.deadline();

        let result = proposal.cast_vote(voter(1), true, deadline);
        assert!(matches!(result, Err(BallotError::VotingClosed { .. })));

        // One millisecond earlier is still open
        let tally = proposal
            .cast_vote(voter(1), true, deadline.saturating_sub_millis(1))
            .unwrap();
        assert_eq!(tally, Tally::new(1, 0));
    }

    #[test]
    fn test_deadline_not_in_future_rejected() {
        let now = Timestamp::from_secs(1_700_000_000);

        let at_now = Proposal::create(ProposalId::new(1), VoterId::ZERO, now, 100, now);
        assert!(matches!(at_now, Err(BallotError::InvalidDeadline { .. })));

        let past = Proposal::create(
            ProposalId::new(1),
            VoterId::ZERO,
            now.saturating_sub_millis(60_000),
            100,
            now,
        );
        assert!(matches!(past, Err(BallotError::InvalidDeadline { .. })));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let now = Timestamp::from_secs(1);
        let result = Proposal::create(
            ProposalId::new(1),
            VoterId::ZERO,
            now.saturating_add_secs(1),
            0,
            now,
        );
        assert!(matches!(result, Err(BallotError::Config(_))));
    }

    #[test]
    fn test_tally_matches_voters_after_every_call() {
        let (mut proposal, now) = open_proposal(10);
        let attempts = [1, 2, 1, 3, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 2];

        for (i, v) in attempts.iter().enumerate() {
            let _ = proposal.cast_vote(voter(*v), i % 2 == 0, now);
            let record = proposal.to_record();
            assert_eq!(proposal.tally().total(), record.voters.len() as u64);
            assert!(proposal.tally().total() <= 10);
        }
        assert_eq!(proposal.tally().total(), 10);
    }

    #[test]
    fn test_record_restores_membership() {
        let (mut proposal, now) = open_proposal(10);
        proposal.cast_vote(voter(1), true, now).unwrap();
        proposal.cast_vote(voter(2), false, now).unwrap();

        let mut restored = Proposal::from_record(proposal.to_record()).unwrap();
        assert_eq!(restored.state(), proposal.state());
        assert!(restored.has_voted(&voter(1)));

        let result = restored.cast_vote(voter(2), true, now);
        assert!(matches!(result, Err(BallotError::DuplicateVote(_))));
    }

    #[test]
    fn test_record_with_mismatched_tally_rejected() {
        let (mut proposal, now) = open_proposal(10);
        proposal.cast_vote(voter(1), true, now).unwrap();

        let mut record = proposal.to_record();
        record.yes_count = 2;
        assert!(matches!(
            Proposal::from_record(record),
            Err(BallotError::SnapshotCorrupted(_))
        ));
    }

    #[test]
    fn test_record_with_overflowing_tally_rejected() {
        let (proposal, _) = open_proposal(10);

        let mut record = proposal.to_record();
        record.yes_count = u64::MAX;
        record.no_count = 1;
        assert!(matches!(
            Proposal::from_record(record),
            Err(BallotError::SnapshotCorrupted(_))
        ));
    }

    #[test]
    fn test_record_with_repeated_voter_rejected() {
        let (mut proposal, now) = open_proposal(10);
        proposal.cast_vote(voter(1), true, now).unwrap();

        let mut record = proposal.to_record();
        record.voters.push(voter(1));
        record.no_count = 1;
        assert!(matches!(
            Proposal::from_record(record),
            Err(BallotError::SnapshotCorrupted(_))
        ));
    }
}
