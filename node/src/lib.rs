//! BALLOTBOX Node Implementation
//!
//! Host process for a proposal registry:
//! - Wall clock for deadlines
//! - Snapshot persistence
//! - HTTP API

mod api;
mod node;
mod runtime;
mod store;

pub use api::*;
pub use node::*;
pub use runtime::*;
pub use store::*;
