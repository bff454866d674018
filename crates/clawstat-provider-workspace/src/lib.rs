//! Agent workspace provider for clawstat
//!
//! This crate discovers session directories under an agent workspace,
//! reads each session's `transcript.json`, and turns the messages into
//! usage entries.

pub mod data_loader;

#[cfg(test)]
pub mod test_utils;

pub use data_loader::{DataLoader, SessionDir, SessionTranscript, WorkspaceScan};
