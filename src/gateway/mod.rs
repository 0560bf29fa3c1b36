//! Chain access subsystem.
//!
//! # Data Flow
//! ```text
//! controllers
//!     → client.rs (ChainGateway: timeouts, missing-provider handling)
//!     → provider.rs (WalletProvider / MintContract port)
//!         → rpc.rs (alloy JSON-RPC node + optional local signer)
//!         → memory.rs (in-process simulation)
//!
//! watchers (accounts, chain, mint events)
//!     → NotificationSink → engine inbound queue
//! ```
//!
//! # Design Decisions
//! - The wallet is an explicit dependency, never ambient state
//! - "No wallet" is a variant (`InjectedProvider::Absent`), checked in one place
//! - The gateway holds no session state; the wallet is the source of truth

pub mod client;
pub mod memory;
pub mod provider;
pub mod rpc;
pub mod types;

pub use client::ChainGateway;
pub use memory::{InMemoryWallet, MintBehaviour};
pub use provider::{InjectedProvider, MintContract, WalletProvider};
pub use rpc::RpcWallet;
pub use types::{
    ChainId, Inclusion, MintCompleted, Notification, NotificationSink, ProviderError,
    ProviderResult, SubscriptionHandle, SubscriptionKind,
};
