//! Resilience patterns.
//!
//! # Components
//! - `backoff.rs`: jittered exponential backoff for the polling watchers
//!
//! # Design Decisions
//! - A failing poll never ends a subscription; it only slows it down
//! - Jitter prevents synchronized polling against the same node

pub mod backoff;

pub use backoff::{calculate_backoff, PollBackoff};
