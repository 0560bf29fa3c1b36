//! Wallet-connected NFT mint client library.

pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod mint;
pub mod observability;
pub mod reconciler;
pub mod resilience;
pub mod session;

pub use config::ClientConfig;
pub use gateway::{ChainGateway, InMemoryWallet, InjectedProvider, RpcWallet, WalletProvider};
pub use lifecycle::Shutdown;
pub use reconciler::{ClientHandle, MintClient, Snapshot};
