//! Core types for BALLOTBOX
//!
//! Defines fundamental data structures used across the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte voter identity
///
/// How the bytes are obtained (key hash, account address, ...) is up to the
/// host; the ledger only compares them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoterId(pub [u8; 32]);

impl VoterId {
    pub const ZERO: VoterId = VoterId([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        VoterId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(VoterId(arr))
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

impl fmt::Debug for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoterId(0x{})", self.to_hex())
    }
}

/// Sequential proposal identifier, assigned by the registry
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ProposalId(pub u64);

impl ProposalId {
    pub fn new(value: u64) -> Self {
        ProposalId(value)
    }

    pub fn next(&self) -> ProposalId {
        ProposalId(self.0 + 1)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalId({})", self.0)
    }
}

/// Timestamp in milliseconds since Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_millis().max(0) as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn saturating_add_millis(self, millis: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(millis))
    }

    pub fn saturating_add_secs(self, secs: u64) -> Timestamp {
        self.saturating_add_millis(secs.saturating_mul(1000))
    }

    pub fn saturating_sub_millis(self, millis: u64) -> Timestamp {
        Timestamp(self.0.saturating_sub(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Yes/no vote counts of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    pub yes_count: u64,
    pub no_count: u64,
}

impl Tally {
    pub fn new(yes_count: u64, no_count: u64) -> Self {
        Self { yes_count, no_count }
    }

    /// Total votes cast
    pub fn total(&self) -> u64 {
        self.yes_count.saturating_add(self.no_count)
    }

    /// Total votes cast, or `None` if the counts cannot belong to one proposal
    pub fn checked_total(&self) -> Option<u64> {
        self.yes_count.checked_add(self.no_count)
    }

    /// Count one vote
    pub fn record(&mut self, choice: bool) {
        if choice {
            self.yes_count += 1;
        } else {
            self.no_count += 1;
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "yes={} no={}", self.yes_count, self.no_count)
    }
}
