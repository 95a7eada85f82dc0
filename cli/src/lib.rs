//! BALLOTBOX CLI Library
//!
//! HTTP client for the node API, shared by the `ballot` binary.

pub mod commands;

pub use commands::*;
