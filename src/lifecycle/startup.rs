//! Startup helpers: configuration and wallet selection.
//!
//! # Design Decisions
//! - A missing config path means defaults, an unreadable one is fatal
//! - A node that cannot be reached at startup is treated like a missing
//!   wallet, so the client still runs and reports it

use alloy::primitives::Address;
use std::path::Path;

use crate::config::{load_config, validate_config, ClientConfig, ConfigError};
use crate::gateway::{InMemoryWallet, InjectedProvider, MintBehaviour, RpcWallet};

/// Account the simulated wallet reports.
pub const SIMULATED_ACCOUNT: Address = Address::repeat_byte(0x11);

/// Load `path`, or validated defaults when no path is given.
pub fn resolve_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            tracing::info!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        None => {
            let config = ClientConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// In-process wallet on the required chain that mines every mint at once.
pub fn simulated_wallet(config: &ClientConfig) -> InMemoryWallet {
    let wallet = InMemoryWallet::new(
        config.network.required_chain_id.as_str(),
        config.contract.capacity,
    );
    wallet.set_accounts(vec![SIMULATED_ACCOUNT]);
    wallet.authorize();
    wallet.set_mint_behaviour(MintBehaviour::AutoInclude);
    wallet
}

/// JSON-RPC wallet, or an absent provider when it cannot be set up.
pub fn rpc_wallet(config: &ClientConfig) -> InjectedProvider<RpcWallet> {
    match RpcWallet::from_env(&config.network, config.contract.confirmation_blocks) {
        Ok(wallet) => InjectedProvider::present(wallet),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize RPC wallet");
            InjectedProvider::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ChainId, WalletProvider};

    #[test]
    fn test_defaults_without_path() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config.network.required_chain_id, "0x4");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = resolve_config(Some(Path::new("/nonexistent/mint-client.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_simulated_wallet_is_ready() {
        let wallet = simulated_wallet(&ClientConfig::default());
        assert_eq!(wallet.authorized_accounts().await, Ok(vec![SIMULATED_ACCOUNT]));
        assert_eq!(wallet.chain_id().await, Ok(ChainId::from("0x4")));
    }
}
