//! JSON-RPC wallet provider built on alloy.
//!
//! # Responsibilities
//! - Answer account and chain queries against a node
//! - Sign with a local key when one is configured, otherwise rely on the
//!   node's unlocked accounts
//! - Submit mints, poll receipts for inclusion
//! - Poll accounts, chain id and contract logs to emulate wallet events
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::eth::Filter;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy::transports::TransportError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, sleep, timeout};

use crate::config::NetworkConfig;
use crate::gateway::provider::{MintContract, WalletProvider};
use crate::gateway::types::{
    ChainId, Inclusion, MintCompleted, Notification, NotificationSink, ProviderError,
    ProviderResult, SubscriptionHandle, SubscriptionKind,
};
use crate::resilience::PollBackoff;

sol! {
    /// The collection contract.
    #[sol(rpc)]
    contract EpicNft {
        /// Emitted once per minted item.
        #[derive(Debug)]
        event NewEpicNFTMinted(address sender, uint256 tokenId);

        function makeAnEpicNFT() external;

        function getTotalNftsMintedSoFar() external view returns (uint256);
    }
}

/// Environment variable name for the signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "MINT_CLIENT_PRIVATE_KEY";

/// EIP-1193 "user rejected the request".
const USER_REJECTED_CODE: i64 = 4001;

fn map_transport_error(e: TransportError) -> ProviderError {
    if let Some(payload) = e.as_error_resp() {
        if payload.code == USER_REJECTED_CODE {
            return ProviderError::UserRejected;
        }
    }
    ProviderError::Rpc(e.to_string())
}

fn map_contract_error(e: alloy::contract::Error) -> ProviderError {
    match e {
        alloy::contract::Error::TransportError(e) => map_transport_error(e),
        other => ProviderError::Rpc(other.to_string()),
    }
}

/// Wallet provider backed by a JSON-RPC node.
#[derive(Clone)]
pub struct RpcWallet {
    provider: DynProvider,
    signer: Option<Address>,
    poll_interval: Duration,
    confirmation_blocks: u32,
}

impl RpcWallet {
    /// Connect using the key in `MINT_CLIENT_PRIVATE_KEY`, if set.
    pub fn from_env(config: &NetworkConfig, confirmation_blocks: u32) -> ProviderResult<Self> {
        let signer = match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(key) => {
                let key = key.trim();
                let key = key.strip_prefix("0x").unwrap_or(key);
                let signer: PrivateKeySigner = key
                    .parse()
                    .map_err(|e| ProviderError::Rpc(format!("Invalid private key format: {}", e)))?;
                Some(signer)
            }
            Err(_) => {
                tracing::info!(
                    env = PRIVATE_KEY_ENV_VAR,
                    "No signing key set, using the node's unlocked accounts"
                );
                None
            }
        };
        Self::new(config, confirmation_blocks, signer)
    }

    /// Connect to `config.rpc_url`, signing with `signer` when given.
    pub fn new(
        config: &NetworkConfig,
        confirmation_blocks: u32,
        signer: Option<PrivateKeySigner>,
    ) -> ProviderResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            ProviderError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let (provider, signer) = match signer {
            Some(signer) => {
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(url);
                (DynProvider::new(provider), Some(address))
            }
            None => (DynProvider::new(ProviderBuilder::new().connect_http(url)), None),
        };

        tracing::info!(
            rpc_url = %config.rpc_url,
            signer = ?signer,
            "RPC wallet initialized"
        );

        Ok(Self {
            provider,
            signer,
            poll_interval: config.poll_interval(),
            confirmation_blocks,
        })
    }

    async fn raw_accounts(&self, method: &'static str) -> ProviderResult<Vec<Address>> {
        if let Some(signer) = self.signer {
            return Ok(vec![signer]);
        }
        self.provider
            .raw_request::<[(); 0], Vec<Address>>(method.into(), [])
            .await
            .map_err(map_transport_error)
    }
}

impl std::fmt::Debug for RpcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWallet")
            .field("signer", &self.signer)
            .field("poll_interval", &self.poll_interval)
            .field("confirmation_blocks", &self.confirmation_blocks)
            .finish()
    }
}

/// Poll `fetch` forever, notifying whenever the value differs from the
/// previous successful poll. The first poll only sets the baseline.
fn spawn_change_watcher<T, F, Fut>(
    kind: SubscriptionKind,
    poll_interval: Duration,
    sink: NotificationSink,
    mut fetch: F,
    wrap: fn(T) -> Notification,
) -> SubscriptionHandle
where
    T: PartialEq + Clone + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ProviderResult<T>> + Send,
{
    let task = tokio::spawn(async move {
        let mut backoff = PollBackoff::new(poll_interval);
        let mut last: Option<T> = None;
        while !sink.is_closed() {
            match fetch().await {
                Ok(value) => {
                    backoff.reset();
                    if last.as_ref() != Some(&value) {
                        let changed = last.is_some();
                        last = Some(value.clone());
                        if changed && !sink.notify(wrap(value)) {
                            break;
                        }
                    }
                }
                Err(e) => {
                    backoff.record_failure();
                    tracing::warn!(kind = kind.as_str(), error = %e, failures = backoff.failures(), "Poll failed");
                }
            }
            sleep(backoff.delay()).await;
        }
        tracing::debug!(kind = kind.as_str(), "Watcher stopped");
    });
    SubscriptionHandle::new(kind, task)
}

impl WalletProvider for RpcWallet {
    type Contract = RpcMintContract;

    async fn authorized_accounts(&self) -> ProviderResult<Vec<Address>> {
        self.raw_accounts("eth_accounts").await
    }

    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        self.raw_accounts("eth_requestAccounts").await
    }

    async fn chain_id(&self) -> ProviderResult<ChainId> {
        let id = self
            .provider
            .raw_request::<[(); 0], String>("eth_chainId".into(), [])
            .await
            .map_err(map_transport_error)?;
        Ok(ChainId(id))
    }

    fn contract(&self, address: Address, signer: Address) -> ProviderResult<RpcMintContract> {
        if let Some(own) = self.signer {
            if own != signer {
                return Err(ProviderError::Rpc(format!(
                    "Signer {} is not managed by this wallet",
                    signer
                )));
            }
        }
        Ok(RpcMintContract {
            provider: self.provider.clone(),
            address,
            from: signer,
            poll_interval: self.poll_interval,
            confirmation_blocks: self.confirmation_blocks,
        })
    }

    fn watch_accounts(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        let wallet = self.clone();
        Ok(spawn_change_watcher(
            SubscriptionKind::Accounts,
            self.poll_interval,
            sink,
            move || {
                let wallet = wallet.clone();
                async move { wallet.authorized_accounts().await }
            },
            Notification::AccountsChanged,
        ))
    }

    fn watch_chain(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        let wallet = self.clone();
        Ok(spawn_change_watcher(
            SubscriptionKind::Chain,
            self.poll_interval,
            sink,
            move || {
                let wallet = wallet.clone();
                async move { wallet.chain_id().await }
            },
            Notification::ChainChanged,
        ))
    }
}

/// Collection contract reached through an [`RpcWallet`].
#[derive(Clone)]
pub struct RpcMintContract {
    provider: DynProvider,
    address: Address,
    from: Address,
    poll_interval: Duration,
    confirmation_blocks: u32,
}

impl RpcMintContract {
    fn instance(&self) -> EpicNft::EpicNftInstance<DynProvider> {
        EpicNft::new(self.address, self.provider.clone())
    }

    /// Decode mint events from blocks after `last_block`, advancing it.
    /// The first call only records the current head.
    async fn poll_mint_events(&self, last_block: &mut Option<u64>) -> ProviderResult<Vec<MintCompleted>> {
        let current_block = self
            .provider
            .get_block_number()
            .await
            .map_err(map_transport_error)?;

        let from_block = match *last_block {
            None => {
                *last_block = Some(current_block);
                return Ok(Vec::new());
            }
            Some(last) if current_block <= last => return Ok(Vec::new()),
            Some(last) => last + 1,
        };

        let filter = Filter::new()
            .address(self.address)
            .from_block(from_block)
            .to_block(current_block)
            .event(EpicNft::NewEpicNFTMinted::SIGNATURE);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(map_transport_error)?;

        let events = logs
            .iter()
            .filter_map(|log| log.log_decode::<EpicNft::NewEpicNFTMinted>().ok())
            .map(|decoded| MintCompleted {
                from: decoded.inner.data.sender,
                token_id: decoded.inner.data.tokenId,
            })
            .collect();

        *last_block = Some(current_block);
        Ok(events)
    }
}

impl MintContract for RpcMintContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn mint(&self) -> ProviderResult<TxHash> {
        let pending = self
            .instance()
            .makeAnEpicNFT()
            .from(self.from)
            .send()
            .await
            .map_err(map_contract_error)?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, "Mint transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash, limit: Duration) -> ProviderResult<Inclusion> {
        let required_confirmations = u64::from(self.confirmation_blocks.max(1));

        let result = timeout(limit, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self
                    .provider
                    .get_transaction_receipt(tx_hash)
                    .await
                    .map_err(map_transport_error)?
                {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Err(ProviderError::Reverted(format!("transaction {} reverted", tx_hash)));
                }

                let current_block = self
                    .provider
                    .get_block_number()
                    .await
                    .map_err(map_transport_error)?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block itself is the first confirmation.
                let confirmations = current_block.saturating_sub(tx_block) + 1;

                if confirmations >= required_confirmations {
                    let token_id = receipt
                        .inner
                        .logs()
                        .iter()
                        .filter(|log| log.address() == self.address)
                        .find_map(|log| log.log_decode::<EpicNft::NewEpicNFTMinted>().ok())
                        .map(|decoded| decoded.inner.data.tokenId);

                    return Ok(Inclusion {
                        tx_hash,
                        block_number: tx_block,
                        token_id,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(inclusion) => inclusion,
            Err(_) => Err(ProviderError::Timeout(limit.as_secs())),
        }
    }

    async fn total_minted(&self) -> ProviderResult<U256> {
        self.instance()
            .getTotalNftsMintedSoFar()
            .call()
            .await
            .map_err(map_contract_error)
    }

    fn watch_mint_events(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        let contract = self.clone();
        let task = tokio::spawn(async move {
            let mut backoff = PollBackoff::new(contract.poll_interval);
            let mut last_block = None;
            while !sink.is_closed() {
                match contract.poll_mint_events(&mut last_block).await {
                    Ok(events) => {
                        backoff.reset();
                        for event in events {
                            if !sink.notify(Notification::MintCompleted(event)) {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        backoff.record_failure();
                        tracing::error!(error = %e, "Error polling mint events");
                    }
                }
                sleep(backoff.delay()).await;
            }
        });
        Ok(SubscriptionHandle::new(SubscriptionKind::MintEvents, task))
    }
}
