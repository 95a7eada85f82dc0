//! Registry snapshots for hosts that persist proposals

use async_trait::async_trait;
use ballotbox_core::{BallotError, BallotResult, ProposalId, Tally, Timestamp, VoterId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Persisted form of one proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub creator: VoterId,
    pub deadline: Timestamp,
    pub created_at: Timestamp,
    pub max_votes: u32,
    pub yes_count: u64,
    pub no_count: u64,
    /// Sorted voter ids
    pub voters: Vec<VoterId>,
}

/// Complete registry state at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Owner allowed to create proposals, if restricted
    pub owner: Option<VoterId>,
    /// Next id the registry will hand out
    pub next_proposal_id: ProposalId,
    /// Proposals ordered by id
    pub proposals: Vec<ProposalRecord>,
    /// When the snapshot was taken
    pub taken_at: Timestamp,
}

impl RegistrySnapshot {
    /// Structural checks that do not need a rebuilt registry
    pub fn verify(&self) -> BallotResult<()> {
        let mut seen = HashSet::with_capacity(self.proposals.len());

        for record in &self.proposals {
            if record.id >= self.next_proposal_id {
                return Err(BallotError::SnapshotCorrupted(format!(
                    "proposal {} is not below next id {}",
                    record.id, self.next_proposal_id
                )));
            }
            if !seen.insert(record.id) {
                return Err(BallotError::SnapshotCorrupted(format!(
                    "proposal {} listed twice",
                    record.id
                )));
            }
            let total = Tally::new(record.yes_count, record.no_count)
                .checked_total()
                .filter(|total| *total <= u64::from(record.max_votes))
                .ok_or_else(|| {
                    BallotError::SnapshotCorrupted(format!(
                        "proposal {}: counts exceed capacity {}",
                        record.id, record.max_votes
                    ))
                })?;
            if total != record.voters.len() as u64 {
                return Err(BallotError::SnapshotCorrupted(format!(
                    "proposal {}: counts do not match voters",
                    record.id
                )));
            }
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> BallotResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> BallotResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn to_json(&self) -> BallotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> BallotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

/// Durable home for registry snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replace the stored snapshot
    async fn save(&self, snapshot: &RegistrySnapshot) -> BallotResult<()>;

    /// Latest stored snapshot, if any
    async fn load(&self) -> BallotResult<Option<RegistrySnapshot>>;
}

/// In-memory snapshot store for testing
#[derive(Default)]
pub struct MemorySnapshotStore {
    bytes: RwLock<Option<Vec<u8>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &RegistrySnapshot) -> BallotResult<()> {
        let bytes = snapshot.to_bytes()?;
        *self.bytes.write() = Some(bytes);
        Ok(())
    }

    async fn load(&self) -> BallotResult<Option<RegistrySnapshot>> {
        match self.bytes.read().as_deref() {
            Some(bytes) => Ok(Some(RegistrySnapshot::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, voters: Vec<VoterId>, yes: u64, no: u64) -> ProposalRecord {
        ProposalRecord {
            id: ProposalId::new(id),
            creator: VoterId::ZERO,
            deadline: Timestamp::from_secs(100),
            created_at: Timestamp::from_secs(1),
            max_votes: 100,
            yes_count: yes,
            no_count: no,
            voters,
        }
    }

    fn snapshot(proposals: Vec<ProposalRecord>, next: u64) -> RegistrySnapshot {
        RegistrySnapshot {
            owner: None,
            next_proposal_id: ProposalId::new(next),
            proposals,
            taken_at: Timestamp::from_secs(50),
        }
    }

    #[test]
    fn test_verify_accepts_consistent_snapshot() {
        let snap = snapshot(
            vec![
                record(0, vec![VoterId([1u8; 32])], 1, 0),
                record(1, vec![], 0, 0),
            ],
            2,
        );
        assert!(snap.verify().is_ok());
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn test_verify_rejects_id_past_counter() {
        let snap = snapshot(vec![record(2, vec![], 0, 0)], 2);
        assert!(matches!(snap.verify(), Err(BallotError::SnapshotCorrupted(_))));
    }

    #[test]
    fn test_verify_rejects_repeated_id() {
        let snap = snapshot(vec![record(0, vec![], 0, 0), record(0, vec![], 0, 0)], 1);
        assert!(matches!(snap.verify(), Err(BallotError::SnapshotCorrupted(_))));
    }

    #[test]
    fn test_verify_rejects_count_mismatch() {
        let snap = snapshot(vec![record(0, vec![VoterId([1u8; 32])], 1, 1)], 1);
        assert!(matches!(snap.verify(), Err(BallotError::SnapshotCorrupted(_))));
    }

    #[test]
    fn test_verify_rejects_overflowing_counts() {
        let snap = snapshot(vec![record(0, vec![], u64::MAX, 1)], 1);
        let restored = RegistrySnapshot::from_bytes(&snap.to_bytes().unwrap()).unwrap();
        assert!(matches!(restored.verify(), Err(BallotError::SnapshotCorrupted(_))));
    }

    #[test]
    fn test_verify_rejects_counts_over_capacity() {
        let mut over = record(0, vec![], 60, 41);
        over.voters = (0..101u32)
            .map(|n| {
                let mut bytes = [0u8; 32];
                bytes[..4].copy_from_slice(&n.to_be_bytes());
                VoterId(bytes)
            })
            .collect();
        let snap = snapshot(vec![over], 1);
        assert!(matches!(snap.verify(), Err(BallotError::SnapshotCorrupted(_))));
    }

    #[test]
    fn test_json_form_is_readable() {
        let snap = snapshot(vec![record(0, vec![], 0, 0)], 1);
        let json = snap.to_json().unwrap();
        assert!(json.contains("next_proposal_id"));
        assert_eq!(RegistrySnapshot::from_json(&json).unwrap(), snap);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = RegistrySnapshot::from_bytes(&[0xff, 0x01]);
        assert!(matches!(result, Err(BallotError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());

        let snap = snapshot(vec![record(0, vec![VoterId([3u8; 32])], 0, 1)], 1);
        store.save(&snap).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(snap));
    }
}
