//! The set of live listeners for one session.
//!
//! Attaching is idempotent per stream kind: a stream that already has a live
//! listener is left alone, so re-running the attach step never doubles
//! notifications.

use alloy::primitives::Address;
use std::collections::BTreeMap;

use crate::gateway::{
    ChainGateway, MintContract, NotificationSink, ProviderResult, SubscriptionHandle,
    SubscriptionKind, WalletProvider,
};

#[derive(Debug, Default)]
pub struct Subscriptions {
    active: BTreeMap<SubscriptionKind, SubscriptionHandle>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    fn open<W: WalletProvider>(
        kind: SubscriptionKind,
        gateway: &ChainGateway<W>,
        signer: Address,
        sink: &NotificationSink,
    ) -> ProviderResult<SubscriptionHandle> {
        match kind {
            SubscriptionKind::Accounts => gateway.watch_accounts(sink.clone()),
            SubscriptionKind::Chain => gateway.watch_chain(sink.clone()),
            SubscriptionKind::MintEvents => gateway
                .bound_contract(signer)?
                .watch_mint_events(sink.clone()),
        }
    }

    /// Ensure every stream has a live listener. Returns how many were
    /// created by this call.
    pub fn attach<W: WalletProvider>(
        &mut self,
        gateway: &ChainGateway<W>,
        signer: Address,
        sink: &NotificationSink,
    ) -> usize {
        let mut created = 0;
        for kind in SubscriptionKind::ALL {
            if self.is_attached(kind) {
                continue;
            }
            match Self::open(kind, gateway, signer, sink) {
                Ok(handle) => {
                    self.active.insert(kind, handle);
                    created += 1;
                }
                Err(e) => {
                    tracing::warn!(kind = kind.as_str(), error = %e, "Failed to attach listener");
                }
            }
        }
        if created > 0 {
            tracing::debug!(created, total = self.active.len(), "Listeners attached");
        }
        created
    }

    /// Whether `kind` has a listener that is still running.
    pub fn is_attached(&self, kind: SubscriptionKind) -> bool {
        self.active
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop every listener. Returns how many were stopped.
    pub fn detach_all(&mut self) -> usize {
        let count = self.active.len();
        for (_, handle) in std::mem::take(&mut self.active) {
            tracing::debug!(kind = handle.kind().as_str(), "Detaching listener");
            handle.cancel();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryWallet, InjectedProvider};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_attach_is_idempotent() {
        let wallet = InMemoryWallet::new("0x4", 10);
        let gateway = ChainGateway::new(
            InjectedProvider::present(wallet.clone()),
            Address::ZERO,
            Duration::from_secs(1),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = NotificationSink::new(tx);
        let mut subscriptions = Subscriptions::new();

        assert_eq!(subscriptions.attach(&gateway, Address::ZERO, &sink), 3);
        assert_eq!(subscriptions.attach(&gateway, Address::ZERO, &sink), 0);
        assert_eq!(subscriptions.len(), 3);
        for kind in SubscriptionKind::ALL {
            assert_eq!(wallet.subscriber_count(kind), 1);
        }

        assert_eq!(subscriptions.detach_all(), 3);
        assert!(subscriptions.is_empty());
    }

    #[tokio::test]
    async fn test_attach_without_provider_creates_nothing() {
        let gateway: ChainGateway<InMemoryWallet> =
            ChainGateway::new(InjectedProvider::Absent, Address::ZERO, Duration::from_secs(1));
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut subscriptions = Subscriptions::new();
        assert_eq!(subscriptions.attach(&gateway, Address::ZERO, &NotificationSink::new(tx)), 0);
        assert!(subscriptions.is_empty());
    }
}
