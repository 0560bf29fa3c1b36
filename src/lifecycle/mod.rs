//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → pick wallet (simulated or JSON-RPC) → spawn engine
//!
//! Shutdown (shutdown.rs):
//!     Trigger → engine detaches listeners → exit
//!
//! Signals (signals.rs):
//!     Ctrl-C → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
