//! Reconciliation engine.
//!
//! # Data Flow
//! ```text
//! ClientHandle intents ─┐
//! wallet / contract     ├─→ inbox (mpsc, ordered) → engine.rs (MintClient)
//! listeners (sink)     ─┤        │
//! background waits     ─┘        ├─→ session (connection, chain guard)
//!                                ├─→ mint (attempt, counter)
//!                                └─→ snapshot.rs → watch channel → presentation
//! ```
//!
//! # Design Decisions
//! - One task owns all state; nothing is shared behind locks
//! - Listeners are attached once per session and detached on disconnect
//! - Mint events are deduplicated by token id

pub mod dedup;
pub mod engine;
pub mod handle;
pub mod messages;
pub mod snapshot;
pub mod subscriptions;

pub use dedup::SeenTokens;
pub use engine::{EngineSettings, MintClient};
pub use handle::{ClientHandle, EngineStopped};
pub use messages::{Completion, Intent, Message};
pub use snapshot::{Notice, Snapshot};
pub use subscriptions::Subscriptions;
