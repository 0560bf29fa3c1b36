//! Typed façade over the injected wallet provider.
//!
//! # Responsibilities
//! - Resolve authorized accounts, prompt for accounts, read the chain id
//! - Bind the collection contract to the active signer
//! - Bound read-only calls with a timeout
//! - Turn a missing provider into `ProviderError::NoProvider` in one place

use alloy::primitives::Address;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::gateway::provider::{InjectedProvider, WalletProvider};
use crate::gateway::types::{
    ChainId, NotificationSink, ProviderError, ProviderResult, SubscriptionHandle,
};

/// Stateless access to the wallet and the collection contract.
pub struct ChainGateway<W> {
    provider: InjectedProvider<W>,
    contract_address: Address,
    timeout_duration: Duration,
}

impl<W: WalletProvider> ChainGateway<W> {
    /// Create a gateway for the contract at `contract_address`.
    pub fn new(
        provider: InjectedProvider<W>,
        contract_address: Address,
        timeout_duration: Duration,
    ) -> Self {
        if !provider.is_present() {
            tracing::warn!("No wallet provider injected, chain operations will fail");
        }
        Self {
            provider,
            contract_address,
            timeout_duration,
        }
    }

    fn wallet(&self) -> ProviderResult<&Arc<W>> {
        self.provider.get().ok_or(ProviderError::NoProvider)
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = ProviderResult<T>>,
    ) -> ProviderResult<T> {
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    /// Accounts the wallet has already authorized. Never prompts; empty when
    /// nothing is authorized.
    pub async fn list_authorized_accounts(&self) -> ProviderResult<Vec<Address>> {
        let wallet = self.wallet()?;
        let accounts = self.bounded(wallet.authorized_accounts()).await?;
        tracing::debug!(count = accounts.len(), "Listed authorized accounts");
        Ok(accounts)
    }

    /// Prompt the user for accounts. Not bounded by the RPC timeout since the
    /// user may take arbitrarily long to answer.
    pub async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        let wallet = self.wallet()?;
        tracing::info!("Requesting account authorization from wallet");
        wallet.request_accounts().await
    }

    /// Chain currently selected in the wallet.
    pub async fn current_chain_id(&self) -> ProviderResult<ChainId> {
        let wallet = self.wallet()?;
        let chain_id = self.bounded(wallet.chain_id()).await?;
        tracing::debug!(chain_id = %chain_id, "Connected to chain");
        Ok(chain_id)
    }

    /// Collection contract bound to `signer`.
    pub fn bound_contract(&self, signer: Address) -> ProviderResult<W::Contract> {
        self.wallet()?.contract(self.contract_address, signer)
    }

    pub fn watch_accounts(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        self.wallet()?.watch_accounts(sink)
    }

    pub fn watch_chain(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        self.wallet()?.watch_chain(sink)
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout_duration
    }
}

impl<W> std::fmt::Debug for ChainGateway<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainGateway")
            .field("provider_present", &self.provider.is_present())
            .field("contract_address", &self.contract_address)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
