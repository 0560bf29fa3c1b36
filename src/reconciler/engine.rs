//! The engine: one task that owns every piece of client state.
//!
//! # Responsibilities
//! - Serialize intents, wallet notifications and background completions
//!   through a single inbox so state transitions never interleave
//! - Attach listeners after a successful connect, detach on disconnect
//! - Keep the mint attempt and the collection counter in step with chain
//!   events
//! - Publish a fresh `Snapshot` after every message
//!
//! Slow work (waiting for inclusion, the event grace timer) runs on spawned
//! tasks that post their result back into the inbox.

use alloy::primitives::{Address, TxHash, U256};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{ClientConfig, ValidationError};
use crate::gateway::{
    ChainGateway, InjectedProvider, MintCompleted, MintContract, Notification, NotificationSink,
    ProviderError, WalletProvider,
};
use crate::mint::{
    AttemptId, CollectionCounter, CounterRefreshError, InclusionOutcome, MintController,
    MintFailure,
};
use crate::observability::metrics;
use crate::reconciler::dedup::SeenTokens;
use crate::reconciler::handle::ClientHandle;
use crate::reconciler::messages::{Completion, Intent, Message};
use crate::reconciler::snapshot::{Notice, Snapshot};
use crate::reconciler::subscriptions::Subscriptions;
use crate::session::{AccountTransition, ChainGuard, ConnectError, ConnectionController, GuardError};

/// Timing and policy knobs for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub confirmation_timeout: Duration,
    pub event_grace: Duration,
    pub reset_mint_on_account_switch: bool,
}

impl EngineSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            confirmation_timeout: config.contract.confirmation_timeout(),
            event_grace: config.contract.event_grace(),
            reset_mint_on_account_switch: config.session.reset_mint_on_account_switch,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

pub struct MintClient<W: WalletProvider> {
    gateway: ChainGateway<W>,
    guard: ChainGuard,
    connection: ConnectionController,
    mint: MintController,
    counter: CollectionCounter,
    subscriptions: Subscriptions,
    settings: EngineSettings,
    notice: Option<Notice>,
    seen_tokens: SeenTokens,
    inbox_tx: mpsc::UnboundedSender<Message>,
    inbox_rx: mpsc::UnboundedReceiver<Message>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl<W: WalletProvider> MintClient<W> {
    pub fn new(
        gateway: ChainGateway<W>,
        guard: ChainGuard,
        capacity: u64,
        settings: EngineSettings,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(Snapshot::initial(capacity));
        Self {
            gateway,
            guard,
            connection: ConnectionController::new(),
            mint: MintController::new(),
            counter: CollectionCounter::new(capacity),
            subscriptions: Subscriptions::new(),
            settings,
            notice: None,
            seen_tokens: SeenTokens::new(capacity),
            inbox_tx,
            inbox_rx,
            snapshot_tx,
        }
    }

    /// Build the whole client from a validated config.
    pub fn from_config(
        provider: InjectedProvider<W>,
        config: &ClientConfig,
    ) -> Result<Self, ValidationError> {
        let contract_address: Address = config
            .contract
            .address
            .parse()
            .map_err(|_| ValidationError::InvalidContractAddress(config.contract.address.clone()))?;
        let gateway = ChainGateway::new(provider, contract_address, config.network.rpc_timeout());
        let guard = ChainGuard::new(config.network.required_chain_id.as_str());
        Ok(Self::new(
            gateway,
            guard,
            config.contract.capacity,
            EngineSettings::from_config(config),
        ))
    }

    pub fn handle(&self) -> ClientHandle {
        ClientHandle::new(self.inbox_tx.clone(), self.snapshot_tx.subscribe())
    }

    /// Run the engine on its own task.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> (ClientHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run(shutdown));
        (handle, task)
    }

    /// Process messages until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            contract = %self.gateway.contract_address(),
            required_chain = %self.guard.required(),
            capacity = self.counter.capacity(),
            "Mint client started"
        );
        self.publish();

        loop {
            tokio::select! {
                message = self.inbox_rx.recv() => {
                    let Some(message) = message else { break };
                    self.dispatch(message).await;
                    self.publish();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping mint client");
                    break;
                }
            }
        }

        let detached = self.subscriptions.detach_all();
        metrics::set_active_listeners(0);
        tracing::info!(detached, "Mint client stopped");
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            active_address: self.connection.active_address(),
            mint: self.mint.status().clone(),
            total_minted: self.counter.total_minted(),
            capacity: self.counter.capacity(),
            is_busy: self.mint.is_busy(),
            can_mint: self.counter.offers_mint(),
            notice: self.notice.clone(),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(move |current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    async fn dispatch(&mut self, message: Message) {
        match message {
            Message::Intent(intent) => {
                metrics::record_intent(intent.as_str());
                match intent {
                    Intent::CheckSilently => self.check_silently().await,
                    Intent::Connect => self.connect().await,
                    Intent::Mint => self.mint().await,
                    Intent::RefreshCounter => self.refresh_counter().await,
                }
            }
            Message::Notification(notification) => {
                metrics::record_notification(notification.kind().as_str());
                self.on_notification(notification).await;
            }
            Message::Completion(completion) => self.on_completion(completion).await,
            Message::Sync(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    // Connection

    async fn check_silently(&mut self) {
        match self.connection.silent_check(&self.gateway).await {
            Ok(Some(address)) => self.on_connected(address).await,
            Ok(None) => {}
            Err(ProviderError::NoProvider) => {
                tracing::info!("Make sure you have a wallet installed");
            }
            Err(e) => tracing::warn!(error = %e, "Silent account check failed"),
        }
    }

    async fn connect(&mut self) {
        match self.connection.connect(&self.gateway).await {
            Ok(address) => {
                if self.notice == Some(Notice::InstallWallet) {
                    self.notice = None;
                }
                self.on_connected(address).await;
            }
            Err(ConnectError::NoProvider) => {
                tracing::warn!("Get a wallet! No provider injected");
                self.notice = Some(Notice::InstallWallet);
            }
            Err(ConnectError::UserRejected) => {
                tracing::info!("User rejected the connection request");
            }
            Err(e) => tracing::warn!(error = %e, "Connect failed"),
        }
    }

    async fn on_connected(&mut self, address: Address) {
        let sink = NotificationSink::new(self.inbox_tx.clone());
        self.subscriptions.attach(&self.gateway, address, &sink);
        metrics::set_active_listeners(self.subscriptions.len());
        let _ = self.verify_chain().await;
    }

    /// Run the chain guard, keeping the wrong-chain notice in step. A pass
    /// refreshes the counter.
    async fn verify_chain(&mut self) -> Result<(), GuardError> {
        match self.guard.verify(&self.gateway).await {
            Ok(_) => {
                if matches!(self.notice, Some(Notice::WrongChain(_))) {
                    self.notice = None;
                }
                self.refresh_counter().await;
                Ok(())
            }
            Err(GuardError::WrongChain(e)) => {
                self.notice = Some(Notice::WrongChain(e.clone()));
                Err(GuardError::WrongChain(e))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the wallet chain");
                Err(e)
            }
        }
    }

    // Counter

    async fn refresh_counter(&mut self) {
        let result = match self.connection.active_address() {
            None => Err(CounterRefreshError::NotConnected),
            Some(signer) => match self.gateway.bound_contract(signer) {
                Ok(contract) => {
                    let limit = self.gateway.timeout_duration();
                    match tokio::time::timeout(limit, self.counter.refresh(&contract)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout(limit.as_secs()).into()),
                    }
                }
                Err(e) => Err(e.into()),
            },
        };

        metrics::record_counter_refresh(result.is_ok());
        match result {
            Ok(total) => metrics::set_total_minted(total),
            Err(CounterRefreshError::NotConnected) => {
                tracing::debug!("Skipping counter refresh, not connected");
            }
            Err(e) => tracing::warn!(error = %e, "Counter refresh failed, keeping last value"),
        }
    }

    // Minting

    async fn mint(&mut self) {
        let Some(attempt) = self.mint.begin() else {
            metrics::record_mint_outcome("ignored_busy");
            return;
        };
        self.publish();

        let Some(signer) = self.connection.active_address() else {
            self.fail(attempt, MintFailure::NotConnected);
            return;
        };

        if let Err(e) = self.verify_chain().await {
            let failure = match e {
                GuardError::WrongChain(e) => MintFailure::WrongChain(e),
                GuardError::Provider(ProviderError::NoProvider) => MintFailure::NoProvider,
                GuardError::Provider(e) => MintFailure::Verification(e),
            };
            self.fail(attempt, failure);
            return;
        }

        let contract = match self.gateway.bound_contract(signer) {
            Ok(contract) => contract,
            Err(e) => {
                self.fail(attempt, MintFailure::Submission(e));
                return;
            }
        };

        self.mint.mark_submitting(attempt);
        self.publish();
        tracing::info!(
            attempt,
            signer = %signer,
            contract = %contract.address(),
            "Going to pop wallet now to pay gas"
        );

        match contract.mint().await {
            Ok(tx_hash) => {
                self.mint.mark_submitted(attempt, tx_hash);
                self.spawn_inclusion_wait(attempt, contract, tx_hash);
            }
            Err(e) => self.fail(attempt, MintFailure::Submission(e)),
        }
    }

    fn fail(&mut self, attempt: AttemptId, failure: MintFailure) {
        let outcome = failure.kind();
        if self.mint.fail(attempt, failure) {
            metrics::record_mint_outcome(outcome);
        }
    }

    fn spawn_inclusion_wait(&self, attempt: AttemptId, contract: W::Contract, tx_hash: TxHash) {
        let inbox = self.inbox_tx.clone();
        let limit = self.settings.confirmation_timeout;
        tokio::spawn(async move {
            let result = contract.wait_for_inclusion(tx_hash, limit).await;
            let _ = inbox.send(Message::Completion(Completion::Included { attempt, result }));
        });
    }

    fn schedule_event_grace(&self, attempt: AttemptId) {
        let inbox = self.inbox_tx.clone();
        let grace = self.settings.event_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = inbox.send(Message::Completion(Completion::EventGraceElapsed { attempt }));
        });
    }

    async fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Included { attempt, result } => {
                let outcome = self.mint.on_inclusion(
                    attempt,
                    result
                        .as_ref()
                        .map_err(|e| MintFailure::Inclusion(e.clone())),
                );
                match outcome {
                    InclusionOutcome::AwaitingEvent => self.schedule_event_grace(attempt),
                    InclusionOutcome::Failed => metrics::record_mint_outcome("inclusion"),
                    InclusionOutcome::AlreadyResolved | InclusionOutcome::Stale => {}
                }
                if result.is_ok() {
                    self.refresh_counter().await;
                }
            }
            Completion::EventGraceElapsed { attempt } => {
                if self.mint.on_event_grace_elapsed(attempt) {
                    let outcome = match self.mint.status().token_id() {
                        Some(token_id) => {
                            // The event may still arrive; it must not touch a later attempt.
                            self.seen_tokens.insert(token_id);
                            "succeeded"
                        }
                        None => "missing_event",
                    };
                    metrics::record_mint_outcome(outcome);
                }
            }
        }
    }

    // Notifications

    async fn on_notification(&mut self, notification: Notification) {
        match notification {
            Notification::AccountsChanged(accounts) => self.on_accounts_changed(&accounts),
            Notification::ChainChanged(chain_id) => {
                if self.connection.is_connected() {
                    tracing::info!(chain_id = %chain_id, "Wallet network changed, re-verifying");
                    let _ = self.verify_chain().await;
                }
            }
            Notification::MintCompleted(event) => self.on_mint_completed(event).await,
        }
    }

    fn on_accounts_changed(&mut self, accounts: &[Address]) {
        match self.connection.on_accounts_changed(accounts) {
            AccountTransition::Disconnected { .. } => {
                self.mint.clear_display();
                self.notice = None;
                let detached = self.subscriptions.detach_all();
                metrics::set_active_listeners(0);
                tracing::debug!(detached, "Listeners detached after disconnect");
            }
            AccountTransition::Switched { .. } => {
                if self.settings.reset_mint_on_account_switch {
                    self.mint.clear_display();
                }
            }
            AccountTransition::Unchanged | AccountTransition::Ignored => {}
        }
    }

    async fn on_mint_completed(&mut self, event: MintCompleted) {
        if !self.seen_tokens.insert(event.token_id) {
            tracing::debug!(token_id = %event.token_id, "Duplicate mint event ignored");
            return;
        }

        let ours = self.connection.active_address() == Some(event.from);
        if ours && self.mint.resolve(event.token_id) {
            metrics::record_mint_outcome("succeeded");
            return;
        }

        tracing::debug!(from = %event.from, token_id = %event.token_id, "Collection minted");
        self.refresh_counter().await;
    }
}

impl<W: WalletProvider> std::fmt::Debug for MintClient<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintClient")
            .field("gateway", &self.gateway)
            .field("guard", &self.guard)
            .field("connection", &self.connection.state())
            .field("mint", self.mint.status())
            .field("counter", &self.counter)
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}
