//! Cloneable handle the presentation layer uses to drive the engine.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use crate::gateway::Notification;
use crate::reconciler::messages::{Intent, Message};
use crate::reconciler::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Mint client engine has stopped")]
pub struct EngineStopped;

#[derive(Debug, Clone)]
pub struct ClientHandle {
    inbox: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<Snapshot>,
}

impl ClientHandle {
    pub(crate) fn new(
        inbox: mpsc::UnboundedSender<Message>,
        snapshots: watch::Receiver<Snapshot>,
    ) -> Self {
        Self { inbox, snapshots }
    }

    fn send(&self, message: Message) -> Result<(), EngineStopped> {
        self.inbox.send(message).map_err(|_| EngineStopped)
    }

    pub fn check_silently(&self) -> Result<(), EngineStopped> {
        self.send(Intent::CheckSilently.into())
    }

    pub fn connect(&self) -> Result<(), EngineStopped> {
        self.send(Intent::Connect.into())
    }

    /// Ask for a mint. Ignored by the engine while an attempt is busy.
    pub fn mint(&self) -> Result<(), EngineStopped> {
        self.send(Intent::Mint.into())
    }

    pub fn refresh_counter(&self) -> Result<(), EngineStopped> {
        self.send(Intent::RefreshCounter.into())
    }

    /// Feed a notification from an external event source, e.g. a host
    /// bridging wallet events itself.
    pub fn notify(&self, notification: Notification) -> Result<(), EngineStopped> {
        self.send(notification.into())
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Wait until every message sent before this call has been handled and
    /// return the resulting snapshot.
    pub async fn sync(&self) -> Result<Snapshot, EngineStopped> {
        let (tx, rx) = oneshot::channel();
        self.send(Message::Sync(tx))?;
        rx.await.map_err(|_| EngineStopped)
    }

    /// Wait for a snapshot matching `predicate`, checking the current one
    /// first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&Snapshot) -> bool,
    ) -> Result<Snapshot, EngineStopped> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| EngineStopped)?
            .clone();
        Ok(snapshot)
    }
}
