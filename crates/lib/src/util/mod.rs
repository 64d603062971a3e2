//! Shared utilities.
//!
//! Content hashing and atomic file replacement used by the persisted state files.

pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;
