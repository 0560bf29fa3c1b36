//! In-process wallet and collection contract.
//!
//! Backs the CLI `--simulate` mode and the test suite. Every knob a real
//! wallet exposes to the user (authorizing, rejecting prompts, switching
//! accounts or networks) and every outcome a real chain can produce
//! (inclusion, revert, drop, late or missing events) can be scripted.

use alloy::primitives::{keccak256, Address, TxHash, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use crate::gateway::provider::{MintContract, WalletProvider};
use crate::gateway::types::{
    ChainId, Inclusion, MintCompleted, Notification, NotificationSink, ProviderError,
    ProviderResult, SubscriptionHandle, SubscriptionKind,
};

const CHANNEL_CAPACITY: usize = 64;

/// Resolved transactions kept for late waiters.
const SLOT_HISTORY: usize = 64;

/// What happens to a mint transaction once the wallet accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintBehaviour {
    /// Include immediately and emit the mint event.
    AutoInclude,
    /// Stay pending until [`InMemoryWallet::include_next`] or
    /// [`InMemoryWallet::revert_next`] is called.
    Manual,
}

type InclusionSlot = watch::Sender<Option<ProviderResult<Inclusion>>>;

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: ChainId,
    reject_requests: bool,
    behaviour: MintBehaviour,
    submission_error: Option<ProviderError>,
    total_minted_error: Option<ProviderError>,
    total_minted: u64,
    capacity: u64,
    next_token_id: u64,
    block_number: u64,
    nonce: u64,
    pending: VecDeque<(TxHash, Address)>,
    /// Outcome per submitted transaction, kept after resolution so late
    /// waiters still observe it.
    slots: HashMap<TxHash, InclusionSlot>,
    slot_order: VecDeque<TxHash>,
    mint_calls: u64,
    total_minted_calls: u64,
}

impl WalletState {
    /// Forget the oldest resolved transactions beyond `SLOT_HISTORY`.
    /// Pending ones are kept, and they are bounded by capacity.
    fn prune_slots(&mut self) {
        while self.slot_order.len() > SLOT_HISTORY {
            let Some(&oldest) = self.slot_order.front() else {
                break;
            };
            let resolved = self
                .slots
                .get(&oldest)
                .map_or(true, |slot| slot.borrow().is_some());
            if !resolved {
                break;
            }
            self.slot_order.pop_front();
            self.slots.remove(&oldest);
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: Mutex<WalletState>,
    accounts_tx: broadcast::Sender<Vec<Address>>,
    chain_tx: broadcast::Sender<ChainId>,
    mint_tx: broadcast::Sender<MintCompleted>,
}

/// Scriptable wallet. Cloning shares the same wallet.
#[derive(Debug, Clone)]
pub struct InMemoryWallet {
    inner: Arc<Inner>,
}

impl InMemoryWallet {
    /// A wallet on `chain_id` with no accounts, fronting a collection of
    /// `capacity` items.
    pub fn new(chain_id: impl Into<ChainId>, capacity: u64) -> Self {
        let (accounts_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (chain_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (mint_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let state = WalletState {
            accounts: Vec::new(),
            authorized: false,
            chain_id: chain_id.into(),
            reject_requests: false,
            behaviour: MintBehaviour::Manual,
            submission_error: None,
            total_minted_error: None,
            total_minted: 0,
            capacity,
            next_token_id: 0,
            block_number: 1,
            nonce: 0,
            pending: VecDeque::new(),
            slots: HashMap::new(),
            slot_order: VecDeque::new(),
            mint_calls: 0,
            total_minted_calls: 0,
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                accounts_tx,
                chain_tx,
                mint_tx,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, WalletState> {
        // A panic while holding the lock can only come from a test assertion.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the wallet's accounts. Authorized listeners see the change.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let visible = {
            let mut state = self.state();
            state.accounts = accounts;
            state.authorized.then(|| state.accounts.clone())
        };
        if let Some(accounts) = visible {
            let _ = self.inner.accounts_tx.send(accounts);
        }
    }

    /// Authorize the current accounts without a prompt, as if the user had
    /// connected in an earlier session.
    pub fn authorize(&self) {
        self.state().authorized = true;
    }

    /// Withdraw authorization; listeners see an empty account list.
    pub fn revoke(&self) {
        self.state().authorized = false;
        let _ = self.inner.accounts_tx.send(Vec::new());
    }

    /// Switch networks.
    pub fn set_chain_id(&self, chain_id: impl Into<ChainId>) {
        let chain_id = chain_id.into();
        self.state().chain_id = chain_id.clone();
        let _ = self.inner.chain_tx.send(chain_id);
    }

    /// Make account prompts fail as if the user dismissed them.
    pub fn reject_requests(&self, reject: bool) {
        self.state().reject_requests = reject;
    }

    pub fn set_mint_behaviour(&self, behaviour: MintBehaviour) {
        self.state().behaviour = behaviour;
    }

    /// Fail the next mint submission with `error`.
    pub fn fail_next_submission(&self, error: ProviderError) {
        self.state().submission_error = Some(error);
    }

    /// Fail every total-supply read with `error` until cleared.
    pub fn fail_total_minted(&self, error: Option<ProviderError>) {
        self.state().total_minted_error = error;
    }

    pub fn set_total_minted(&self, total: u64) {
        self.state().total_minted = total;
    }

    /// Include the oldest pending mint. Returns its hash and token id. The
    /// mint event is not emitted; use [`emit_mint`](Self::emit_mint).
    pub fn include_next(&self) -> Option<(TxHash, U256)> {
        let mut state = self.state();
        let (tx_hash, _) = state.pending.pop_front()?;
        let token_id = U256::from(state.next_token_id);
        state.next_token_id += 1;
        state.total_minted += 1;
        state.block_number += 1;
        let inclusion = Inclusion {
            tx_hash,
            block_number: state.block_number,
            token_id: Some(token_id),
        };
        if let Some(slot) = state.slots.get(&tx_hash) {
            slot.send_replace(Some(Ok(inclusion)));
        }
        Some((tx_hash, token_id))
    }

    /// Revert the oldest pending mint.
    pub fn revert_next(&self, reason: &str) -> Option<TxHash> {
        self.resolve_next_with(ProviderError::Reverted(reason.to_string()))
    }

    /// Drop the oldest pending mint from the mempool.
    pub fn drop_next(&self) -> Option<TxHash> {
        self.resolve_next_with(ProviderError::Dropped("replaced or evicted".to_string()))
    }

    fn resolve_next_with(&self, error: ProviderError) -> Option<TxHash> {
        let mut state = self.state();
        let (tx_hash, _) = state.pending.pop_front()?;
        if let Some(slot) = state.slots.get(&tx_hash) {
            slot.send_replace(Some(Err(error)));
        }
        Some(tx_hash)
    }

    /// Emit a mint-completed event from the contract.
    pub fn emit_mint(&self, from: Address, token_id: U256) {
        let _ = self.inner.mint_tx.send(MintCompleted { from, token_id });
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn mint_calls(&self) -> u64 {
        self.state().mint_calls
    }

    pub fn total_minted_calls(&self) -> u64 {
        self.state().total_minted_calls
    }

    /// Number of live listeners on one notification stream.
    pub fn subscriber_count(&self, kind: SubscriptionKind) -> usize {
        match kind {
            SubscriptionKind::Accounts => self.inner.accounts_tx.receiver_count(),
            SubscriptionKind::Chain => self.inner.chain_tx.receiver_count(),
            SubscriptionKind::MintEvents => self.inner.mint_tx.receiver_count(),
        }
    }

    fn submit(&self, signer: Address) -> ProviderResult<TxHash> {
        let (tx_hash, auto) = {
            let mut state = self.state();
            state.mint_calls += 1;
            if let Some(error) = state.submission_error.take() {
                return Err(error);
            }
            if !state.authorized || !state.accounts.contains(&signer) {
                return Err(ProviderError::Rpc(format!("unknown account {}", signer)));
            }
            if state.total_minted + state.pending.len() as u64 >= state.capacity {
                return Err(ProviderError::Rpc("execution reverted: sold out".to_string()));
            }
            state.nonce += 1;
            let mut seed = signer.to_vec();
            seed.extend_from_slice(&state.nonce.to_be_bytes());
            let tx_hash = keccak256(&seed);
            let (slot, _) = watch::channel(None);
            state.slots.insert(tx_hash, slot);
            state.slot_order.push_back(tx_hash);
            state.prune_slots();
            state.pending.push_back((tx_hash, signer));
            (tx_hash, state.behaviour == MintBehaviour::AutoInclude)
        };

        if auto {
            if let Some((_, token_id)) = self.include_next() {
                self.emit_mint(signer, token_id);
            }
        }
        Ok(tx_hash)
    }

    async fn await_inclusion(&self, tx: TxHash, timeout: Duration) -> ProviderResult<Inclusion> {
        let mut rx = {
            let state = self.state();
            match state.slots.get(&tx) {
                Some(slot) => slot.subscribe(),
                None => {
                    return Err(ProviderError::Dropped(format!("unknown transaction {}", tx)));
                }
            }
        };

        let wait = async {
            match rx.wait_for(|outcome| outcome.is_some()).await {
                Ok(outcome) => outcome.clone().unwrap_or_else(|| {
                    Err(ProviderError::Dropped(format!("transaction {} vanished", tx)))
                }),
                Err(_) => Err(ProviderError::Dropped(format!("transaction {} vanished", tx))),
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout.as_secs())),
        }
    }
}

/// Forward a broadcast stream into the engine until either side closes.
fn forward<T, F>(
    kind: SubscriptionKind,
    mut rx: broadcast::Receiver<T>,
    sink: NotificationSink,
    wrap: F,
) -> SubscriptionHandle
where
    T: Clone + Send + 'static,
    F: Fn(T) -> Notification + Send + 'static,
{
    let task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(value) => {
                    if !sink.notify(wrap(value)) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(kind = kind.as_str(), skipped, "Listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    SubscriptionHandle::new(kind, task)
}

impl WalletProvider for InMemoryWallet {
    type Contract = InMemoryContract;

    async fn authorized_accounts(&self) -> ProviderResult<Vec<Address>> {
        let state = self.state();
        Ok(if state.authorized {
            state.accounts.clone()
        } else {
            Vec::new()
        })
    }

    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        let mut state = self.state();
        if state.reject_requests {
            return Err(ProviderError::UserRejected);
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> ProviderResult<ChainId> {
        Ok(self.state().chain_id.clone())
    }

    fn contract(&self, address: Address, signer: Address) -> ProviderResult<InMemoryContract> {
        Ok(InMemoryContract {
            wallet: self.clone(),
            address,
            signer,
        })
    }

    fn watch_accounts(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        let rx = self.inner.accounts_tx.subscribe();
        Ok(forward(SubscriptionKind::Accounts, rx, sink, Notification::AccountsChanged))
    }

    fn watch_chain(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        let rx = self.inner.chain_tx.subscribe();
        Ok(forward(SubscriptionKind::Chain, rx, sink, Notification::ChainChanged))
    }
}

/// Collection contract bound to one signer of an [`InMemoryWallet`].
#[derive(Debug, Clone)]
pub struct InMemoryContract {
    wallet: InMemoryWallet,
    address: Address,
    signer: Address,
}

impl MintContract for InMemoryContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn mint(&self) -> ProviderResult<TxHash> {
        self.wallet.submit(self.signer)
    }

    async fn wait_for_inclusion(&self, tx: TxHash, timeout: Duration) -> ProviderResult<Inclusion> {
        self.wallet.await_inclusion(tx, timeout).await
    }

    async fn total_minted(&self) -> ProviderResult<U256> {
        let mut state = self.wallet.state();
        state.total_minted_calls += 1;
        match &state.total_minted_error {
            Some(error) => Err(error.clone()),
            None => Ok(U256::from(state.total_minted)),
        }
    }

    fn watch_mint_events(&self, sink: NotificationSink) -> ProviderResult<SubscriptionHandle> {
        let rx = self.wallet.inner.mint_tx.subscribe();
        Ok(forward(SubscriptionKind::MintEvents, rx, sink, Notification::MintCompleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn connected_wallet() -> InMemoryWallet {
        let wallet = InMemoryWallet::new("0x4", 3);
        wallet.set_accounts(vec![alice()]);
        wallet.authorize();
        wallet
    }

    #[tokio::test]
    async fn test_rejected_prompt() {
        let wallet = InMemoryWallet::new("0x4", 3);
        wallet.reject_requests(true);
        assert_eq!(wallet.request_accounts().await, Err(ProviderError::UserRejected));
    }

    #[tokio::test]
    async fn test_manual_inclusion() {
        let wallet = connected_wallet();
        let contract = wallet.contract(Address::ZERO, alice()).unwrap();

        let tx = contract.mint().await.unwrap();
        assert_eq!(wallet.pending_count(), 1);

        let (included, token_id) = wallet.include_next().unwrap();
        assert_eq!(included, tx);
        let inclusion = contract
            .wait_for_inclusion(tx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(inclusion.token_id, Some(token_id));
        assert_eq!(contract.total_minted().await.unwrap(), U256::from(1));
        assert_eq!(wallet.total_minted_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolved_slots_are_bounded() {
        let wallet = InMemoryWallet::new("0x4", 200);
        wallet.set_accounts(vec![alice()]);
        wallet.authorize();
        wallet.set_mint_behaviour(MintBehaviour::AutoInclude);
        let contract = wallet.contract(Address::ZERO, alice()).unwrap();

        let mut last = TxHash::ZERO;
        for _ in 0..(SLOT_HISTORY + 10) {
            last = contract.mint().await.unwrap();
        }

        assert_eq!(wallet.state().slots.len(), SLOT_HISTORY);
        let inclusion = contract
            .wait_for_inclusion(last, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(inclusion.tx_hash, last);
    }

    #[tokio::test]
    async fn test_revert_and_timeout() {
        let wallet = connected_wallet();
        let contract = wallet.contract(Address::ZERO, alice()).unwrap();

        let tx = contract.mint().await.unwrap();
        wallet.revert_next("boom");
        let err = contract
            .wait_for_inclusion(tx, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Reverted("boom".into()));

        let tx = contract.mint().await.unwrap();
        let err = contract
            .wait_for_inclusion(tx, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_sold_out_submission_reverts() {
        let wallet = connected_wallet();
        wallet.set_total_minted(3);
        let contract = wallet.contract(Address::ZERO, alice()).unwrap();
        assert!(matches!(contract.mint().await, Err(ProviderError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_unauthorized_signer_cannot_mint() {
        let wallet = InMemoryWallet::new("0x4", 3);
        wallet.set_accounts(vec![alice()]);
        let contract = wallet.contract(Address::ZERO, alice()).unwrap();
        assert!(contract.mint().await.is_err());
    }

    #[tokio::test]
    async fn test_auto_include_emits_event() {
        let wallet = connected_wallet();
        wallet.set_mint_behaviour(MintBehaviour::AutoInclude);
        let mut events = wallet.inner.mint_tx.subscribe();
        let contract = wallet.contract(Address::ZERO, alice()).unwrap();

        let tx = contract.mint().await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event, MintCompleted { from: alice(), token_id: U256::ZERO });
        let inclusion = contract
            .wait_for_inclusion(tx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(inclusion.tx_hash, tx);
    }
}
