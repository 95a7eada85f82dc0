//! BALLOTBOX Voting Ledger
//!
//! Implements deadline-bounded yes/no voting with:
//! - One vote per voter per proposal
//! - A hard per-proposal vote capacity
//! - A registry handing out sequential proposal ids
//! - Snapshots for hosts that persist state

pub mod voters;
pub mod proposal;
pub mod registry;
pub mod snapshot;

pub use voters::*;
pub use proposal::*;
pub use registry::*;
pub use snapshot::*;
