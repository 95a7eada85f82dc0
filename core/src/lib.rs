//! BALLOTBOX Core Library
//!
//! Core types, errors, configuration and the clock abstraction shared by
//! the ledger, node and CLI crates.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
