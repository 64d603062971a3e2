//! Configure-step cache reconciliation.
//!
//! Every binary directory owns a [`CacheTracker`] recording which arguments
//! were last applied by a successful configure step. Before configuring, the
//! tracker computes the arguments that actually need to be passed; after the
//! configure step succeeds, the proposal is confirmed.

pub mod tracker;

pub use tracker::{CacheTracker, Proposal, TrackerError, TrackerPhase, TrackerState};
