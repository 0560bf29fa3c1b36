//! Minting subsystem.
//!
//! # Data Flow
//! ```text
//! mint intent
//!     → controller.rs (MintController: one attempt, busy flag)
//!     → gateway (bound contract: submit, wait for inclusion)
//!     → mint event / inclusion completion → controller resolves
//!
//! chain verified, inclusion observed, foreign mint event
//!     → counter.rs (CollectionCounter: re-read total from the contract)
//! ```

pub mod controller;
pub mod counter;
pub mod types;

pub use controller::{AttemptId, InclusionOutcome, MintController};
pub use counter::{offers_mint, CollectionCounter, CounterRefreshError};
pub use types::{MintFailure, MintStatus};
