//! Active-address lifecycle.
//!
//! # State Transitions
//! ```text
//! Disconnected → Connected(a): silent check finds authorized accounts [a, ..]
//! Disconnected → Connected(a): connect prompt returns [a, ..]
//! Connected(a) → Disconnected: accounts changed to []
//! Connected(a) → Connected(b): accounts changed to [b, ..]
//! ```
//! Any other notification is ignored.

use alloy::primitives::Address;
use serde::Serialize;
use thiserror::Error;

use crate::gateway::{ChainGateway, ProviderError, ProviderResult, WalletProvider};

/// Which address, if any, the session acts for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(Address),
}

impl ConnectionState {
    pub fn address(&self) -> Option<Address> {
        match self {
            ConnectionState::Disconnected => None,
            ConnectionState::Connected(address) => Some(*address),
        }
    }
}

/// Failure of an explicit connect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// No wallet extension; the user has to install one.
    #[error("Get a wallet! No wallet provider was found")]
    NoProvider,

    /// The user dismissed the prompt.
    #[error("Connection request rejected")]
    UserRejected,

    #[error("Wallet authorized no accounts")]
    NoAccounts,

    #[error(transparent)]
    Provider(ProviderError),
}

impl From<ProviderError> for ConnectError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NoProvider => ConnectError::NoProvider,
            ProviderError::UserRejected => ConnectError::UserRejected,
            other => ConnectError::Provider(other),
        }
    }
}

/// What an account-change notification did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountTransition {
    /// The wallet withdrew every account.
    Disconnected { previous: Address },
    /// The first account changed.
    Switched { from: Address, to: Address },
    Unchanged,
    /// Not valid in the current state; dropped.
    Ignored,
}

#[derive(Debug, Default)]
pub struct ConnectionController {
    state: ConnectionState,
}

impl ConnectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn active_address(&self) -> Option<Address> {
        self.state.address()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Adopt an already-authorized account without prompting.
    ///
    /// Returns the active address, or `None` when nothing is authorized.
    pub async fn silent_check<W: WalletProvider>(
        &mut self,
        gateway: &ChainGateway<W>,
    ) -> ProviderResult<Option<Address>> {
        if let ConnectionState::Connected(address) = self.state {
            return Ok(Some(address));
        }

        let accounts = gateway.list_authorized_accounts().await?;
        match accounts.first() {
            Some(&account) => {
                tracing::info!(account = %account, "Found an authorized account");
                self.state = ConnectionState::Connected(account);
                Ok(Some(account))
            }
            None => {
                tracing::info!("No authorized account found");
                Ok(None)
            }
        }
    }

    /// Prompt the user for an account.
    pub async fn connect<W: WalletProvider>(
        &mut self,
        gateway: &ChainGateway<W>,
    ) -> Result<Address, ConnectError> {
        if let ConnectionState::Connected(address) = self.state {
            return Ok(address);
        }

        let accounts = gateway.request_accounts().await?;
        let account = *accounts.first().ok_or(ConnectError::NoAccounts)?;
        tracing::info!(account = %account, "Connected");
        self.state = ConnectionState::Connected(account);
        Ok(account)
    }

    /// Apply an account-change notification.
    pub fn on_accounts_changed(&mut self, accounts: &[Address]) -> AccountTransition {
        match (self.state, accounts.first()) {
            (ConnectionState::Connected(previous), None) => {
                tracing::info!(previous = %previous, "Wallet disconnected");
                self.state = ConnectionState::Disconnected;
                AccountTransition::Disconnected { previous }
            }
            (ConnectionState::Connected(from), Some(&to)) if from == to => {
                AccountTransition::Unchanged
            }
            (ConnectionState::Connected(from), Some(&to)) => {
                tracing::info!(from = %from, to = %to, "Switched account");
                self.state = ConnectionState::Connected(to);
                AccountTransition::Switched { from, to }
            }
            (ConnectionState::Disconnected, None) => AccountTransition::Unchanged,
            (ConnectionState::Disconnected, Some(account)) => {
                tracing::debug!(account = %account, "Ignoring account change while disconnected");
                AccountTransition::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryWallet, InjectedProvider};
    use std::time::Duration;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn gateway(wallet: &InMemoryWallet) -> ChainGateway<InMemoryWallet> {
        ChainGateway::new(
            InjectedProvider::present(wallet.clone()),
            Address::ZERO,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_silent_check_without_authorization() {
        let wallet = InMemoryWallet::new("0x4", 10);
        wallet.set_accounts(vec![addr(1)]);
        let mut controller = ConnectionController::new();

        assert_eq!(controller.silent_check(&gateway(&wallet)).await, Ok(None));
        assert_eq!(controller.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_silent_check_adopts_first_account() {
        let wallet = InMemoryWallet::new("0x4", 10);
        wallet.set_accounts(vec![addr(1), addr(2)]);
        wallet.authorize();
        let mut controller = ConnectionController::new();

        assert_eq!(controller.silent_check(&gateway(&wallet)).await, Ok(Some(addr(1))));
        assert_eq!(controller.active_address(), Some(addr(1)));
    }

    #[tokio::test]
    async fn test_connect_errors() {
        let wallet = InMemoryWallet::new("0x4", 10);
        wallet.set_accounts(vec![addr(1)]);
        wallet.reject_requests(true);
        let mut controller = ConnectionController::new();

        assert_eq!(
            controller.connect(&gateway(&wallet)).await,
            Err(ConnectError::UserRejected)
        );
        assert!(!controller.is_connected());

        let absent: ChainGateway<InMemoryWallet> =
            ChainGateway::new(InjectedProvider::Absent, Address::ZERO, Duration::from_secs(1));
        assert_eq!(controller.connect(&absent).await, Err(ConnectError::NoProvider));

        let empty = InMemoryWallet::new("0x4", 10);
        assert_eq!(
            controller.connect(&gateway(&empty)).await,
            Err(ConnectError::NoAccounts)
        );
    }

    #[test]
    fn test_account_notifications() {
        let mut controller = ConnectionController::new();
        assert_eq!(controller.on_accounts_changed(&[addr(1)]), AccountTransition::Ignored);
        assert_eq!(controller.active_address(), None);

        controller.state = ConnectionState::Connected(addr(1));
        assert_eq!(controller.on_accounts_changed(&[addr(1)]), AccountTransition::Unchanged);
        assert_eq!(
            controller.on_accounts_changed(&[addr(2), addr(1)]),
            AccountTransition::Switched { from: addr(1), to: addr(2) }
        );
        assert_eq!(
            controller.on_accounts_changed(&[]),
            AccountTransition::Disconnected { previous: addr(2) }
        );
        assert_eq!(controller.on_accounts_changed(&[]), AccountTransition::Unchanged);
    }

    #[test]
    fn test_active_address_tracks_latest_notification() {
        let sequences: [&[u8]; 4] = [&[1, 2, 3], &[3, 0, 2], &[2, 2, 0, 1], &[0, 4]];
        for seq in sequences {
            let mut controller = ConnectionController::new();
            controller.state = ConnectionState::Connected(addr(9));
            let mut connected = true;
            for &b in seq {
                let accounts = if b == 0 { vec![] } else { vec![addr(b), addr(0xff)] };
                controller.on_accounts_changed(&accounts);
                if connected {
                    let expected = accounts.first().copied();
                    assert_eq!(controller.active_address(), expected);
                    connected = expected.is_some();
                } else {
                    assert_eq!(controller.active_address(), None);
                }
            }
        }
    }
}
