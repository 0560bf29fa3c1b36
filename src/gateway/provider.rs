//! The port between the client and whatever wallet sits behind it.
//!
//! Implementations: [`RpcWallet`](crate::gateway::rpc::RpcWallet) talks
//! JSON-RPC through alloy, [`InMemoryWallet`](crate::gateway::memory::InMemoryWallet)
//! simulates everything in process.

use alloy::primitives::{Address, TxHash, U256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::gateway::types::{
    ChainId, Inclusion, NotificationSink, ProviderResult, SubscriptionHandle,
};

/// A wallet provider: key holder, signer and account/chain oracle.
pub trait WalletProvider: Send + Sync + 'static {
    /// Contract handle bound to one of this wallet's signers.
    type Contract: MintContract;

    /// Accounts already authorized for this client. Never prompts.
    fn authorized_accounts(&self) -> impl Future<Output = ProviderResult<Vec<Address>>> + Send;

    /// Ask the user to authorize accounts. May show a prompt.
    fn request_accounts(&self) -> impl Future<Output = ProviderResult<Vec<Address>>> + Send;

    /// Currently selected chain, as reported by the wallet.
    fn chain_id(&self) -> impl Future<Output = ProviderResult<ChainId>> + Send;

    /// Bind the collection contract at `address` to `signer`.
    fn contract(&self, address: Address, signer: Address) -> ProviderResult<Self::Contract>;

    /// Start delivering account-change notifications into `sink`.
    fn watch_accounts(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle>;

    /// Start delivering chain-change notifications into `sink`.
    fn watch_chain(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle>;
}

/// The two calls and one event the client consumes from the collection
/// contract.
pub trait MintContract: Clone + Send + Sync + 'static {
    fn address(&self) -> Address;

    /// Submit a mint transaction. Resolves once the wallet accepted it.
    fn mint(&self) -> impl Future<Output = ProviderResult<TxHash>> + Send;

    /// Wait until `tx` is included, reverted, dropped, or `timeout` elapses.
    fn wait_for_inclusion(
        &self,
        tx: TxHash,
        timeout: Duration,
    ) -> impl Future<Output = ProviderResult<Inclusion>> + Send;

    /// Number of items minted so far.
    fn total_minted(&self) -> impl Future<Output = ProviderResult<U256>> + Send;

    /// Start delivering mint-completed events into `sink`.
    fn watch_mint_events(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle>;
}

/// The injected wallet, or the explicit lack of one.
#[derive(Debug)]
pub enum InjectedProvider<W> {
    Absent,
    Present(Arc<W>),
}

impl<W> InjectedProvider<W> {
    pub fn present(wallet: W) -> Self {
        Self::Present(Arc::new(wallet))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, InjectedProvider::Present(_))
    }

    pub fn get(&self) -> Option<&Arc<W>> {
        match self {
            InjectedProvider::Absent => None,
            InjectedProvider::Present(wallet) => Some(wallet),
        }
    }
}

impl<W> Clone for InjectedProvider<W> {
    fn clone(&self) -> Self {
        match self {
            InjectedProvider::Absent => InjectedProvider::Absent,
            InjectedProvider::Present(wallet) => InjectedProvider::Present(wallet.clone()),
        }
    }
}
