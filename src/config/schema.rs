//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the mint client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Network the client is allowed to operate on.
    pub network: NetworkConfig,

    /// Minting contract location and confirmation policy.
    pub contract: ContractConfig,

    /// Session policies.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain id the wallet must report, compared as a literal string
    /// (e.g. "0x4" for Rinkeby).
    pub required_chain_id: String,

    /// JSON-RPC endpoint backing the wallet provider.
    pub rpc_url: String,

    /// Timeout for read-only provider calls in seconds.
    pub rpc_timeout_secs: u64,

    /// Polling interval for account, chain and event watchers in milliseconds.
    pub poll_interval_ms: u64,
}

impl NetworkConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            required_chain_id: "0x4".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            rpc_timeout_secs: 10,
            poll_interval_ms: 2000,
        }
    }
}

/// Minting contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the collection contract.
    pub address: String,

    /// Maximum number of items the collection can hold.
    pub capacity: u64,

    /// Number of block confirmations before a mint counts as included.
    pub confirmation_blocks: u32,

    /// Upper bound on waiting for inclusion, in seconds.
    pub confirmation_timeout_secs: u64,

    /// How long to wait for the mint event after inclusion before falling
    /// back to the receipt, in seconds.
    pub event_grace_secs: u64,
}

impl ContractConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn event_grace(&self) -> Duration {
        Duration::from_secs(self.event_grace_secs)
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: "0xB7eecfcA618c2CbB5Fd00Af6863Eb36bCb3f1026".to_string(),
            capacity: 100,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 300,
            event_grace_secs: 30,
        }
    }
}

/// Session behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reset a finished mint attempt when the wallet switches accounts.
    pub reset_mint_on_account_switch: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
