//! Error types for BALLOTBOX

use crate::types::{ProposalId, Timestamp, VoterId};
use thiserror::Error;

/// Main error type for BALLOTBOX
#[derive(Error, Debug)]
pub enum BallotError {
    // ============ Proposal Errors ============
    #[error("Invalid deadline: {deadline} is not after {now}")]
    InvalidDeadline { deadline: Timestamp, now: Timestamp },

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Unauthorized: {0} may not create proposals")]
    Unauthorized(VoterId),

    // ============ Vote Errors ============
    #[error("Voting closed: deadline {deadline} reached at {now}")]
    VotingClosed { deadline: Timestamp, now: Timestamp },

    #[error("Capacity exceeded: proposal already holds {max_votes} votes")]
    CapacityExceeded { max_votes: u32 },

    #[error("Duplicate vote from {0}")]
    DuplicateVote(VoterId),

    // ============ Storage Errors ============
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Snapshot corrupted: {0}")]
    SnapshotCorrupted(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid voter id: {0}")]
    InvalidVoterId(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BallotError {
    /// True for outcomes a caller is expected to branch on (a rejected
    /// vote or creation), false for infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BallotError::InvalidDeadline { .. }
                | BallotError::ProposalNotFound(_)
                | BallotError::Unauthorized(_)
                | BallotError::VotingClosed { .. }
                | BallotError::CapacityExceeded { .. }
                | BallotError::DuplicateVote(_)
        )
    }
}

impl From<std::io::Error> for BallotError {
    fn from(err: std::io::Error) -> Self {
        BallotError::Storage(err.to_string())
    }
}

impl From<bincode::Error> for BallotError {
    fn from(err: bincode::Error) -> Self {
        BallotError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for BallotError {
    fn from(err: serde_json::Error) -> Self {
        BallotError::Serialization(err.to_string())
    }
}
