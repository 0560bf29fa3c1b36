//! Session subsystem: who is connected, and on which network.
//!
//! # Data Flow
//! ```text
//! checkSilently / connect intents, account-change notifications
//!     → connection.rs (ConnectionController: Disconnected ⇄ Connected)
//!
//! connect success, chain-change notifications, mint intents
//!     → guard.rs (ChainGuard: literal chain id comparison)
//!     → on pass, the engine refreshes the collection counter
//! ```

pub mod connection;
pub mod guard;

pub use connection::{AccountTransition, ConnectError, ConnectionController, ConnectionState};
pub use guard::{ChainGuard, GuardError, WrongChainError};
