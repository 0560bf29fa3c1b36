//! Chain-facing types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::reconciler::messages::Message;

/// Chain id exactly as the wallet reports it (e.g. "0x4").
///
/// Equality is literal: "0x4" and "0x04" are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ChainId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors reported by the wallet provider or the contract behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ProviderError {
    /// No wallet extension is reachable.
    #[error("No wallet provider found, install a wallet to continue")]
    NoProvider,

    /// The user dismissed a wallet prompt.
    #[error("User rejected the request")]
    UserRejected,

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Transaction disappeared before inclusion.
    #[error("Transaction dropped: {0}")]
    Dropped(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Outcome of waiting for a submitted mint transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Token id decoded from the receipt logs, if the mint event was found.
    pub token_id: Option<U256>,
}

/// Mint-completed event emitted by the collection contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintCompleted {
    pub from: Address,
    pub token_id: U256,
}

/// Asynchronous notification pushed by the provider or the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
    MintCompleted(MintCompleted),
}

impl Notification {
    /// The stream this notification arrives on.
    pub fn kind(&self) -> SubscriptionKind {
        match self {
            Notification::AccountsChanged(_) => SubscriptionKind::Accounts,
            Notification::ChainChanged(_) => SubscriptionKind::Chain,
            Notification::MintCompleted(_) => SubscriptionKind::MintEvents,
        }
    }
}

/// The three notification streams a session listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubscriptionKind {
    Accounts,
    Chain,
    MintEvents,
}

impl SubscriptionKind {
    pub const ALL: [SubscriptionKind; 3] = [
        SubscriptionKind::Accounts,
        SubscriptionKind::Chain,
        SubscriptionKind::MintEvents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::Accounts => "accounts",
            SubscriptionKind::Chain => "chain",
            SubscriptionKind::MintEvents => "mint_events",
        }
    }
}

/// Where watchers deliver notifications: the engine's ordered inbound queue.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl NotificationSink {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    /// Enqueue a notification. Returns false once the engine has stopped.
    pub fn notify(&self, notification: Notification) -> bool {
        self.tx.send(Message::Notification(notification)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// An active listener. Dropping the handle stops the listener.
#[derive(Debug)]
pub struct SubscriptionHandle {
    kind: SubscriptionKind,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn new(kind: SubscriptionKind, task: JoinHandle<()>) -> Self {
        Self { kind, task }
    }

    pub fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the listener.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_is_literal() {
        assert_eq!(ChainId::from("0x4"), ChainId::from("0x4".to_string()));
        assert_ne!(ChainId::from("0x4"), ChainId::from("0x04"));
        assert_eq!(ChainId::from("0x4").to_string(), "0x4");
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ProviderError::Reverted("out of stock".into());
        assert!(err.to_string().contains("out of stock"));
    }

    #[test]
    fn test_notification_kind() {
        let n = Notification::ChainChanged("0x1".into());
        assert_eq!(n.kind(), SubscriptionKind::Chain);
        assert_eq!(n.kind().as_str(), "chain");
    }

    #[tokio::test]
    async fn test_sink_reports_closed_engine() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = NotificationSink::new(tx);
        assert!(sink.notify(Notification::AccountsChanged(vec![])));
        drop(rx);
        assert!(sink.is_closed());
        assert!(!sink.notify(Notification::AccountsChanged(vec![])));
    }
}
