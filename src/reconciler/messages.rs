//! Everything the engine reacts to, as one ordered message type.

use tokio::sync::oneshot;

use crate::gateway::{Inclusion, Notification, ProviderResult};
use crate::mint::AttemptId;
use crate::reconciler::snapshot::Snapshot;

/// A request from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Adopt an already-authorized account without prompting.
    CheckSilently,
    /// Prompt the wallet for an account.
    Connect,
    Mint,
    RefreshCounter,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CheckSilently => "check_silently",
            Intent::Connect => "connect",
            Intent::Mint => "mint",
            Intent::RefreshCounter => "refresh_counter",
        }
    }
}

/// Results of work the engine started on a background task.
#[derive(Debug)]
pub enum Completion {
    Included {
        attempt: AttemptId,
        result: ProviderResult<Inclusion>,
    },
    EventGraceElapsed {
        attempt: AttemptId,
    },
}

#[derive(Debug)]
pub enum Message {
    Intent(Intent),
    Notification(Notification),
    Completion(Completion),
    /// Reply with the snapshot once every earlier message is handled.
    Sync(oneshot::Sender<Snapshot>),
}

impl From<Intent> for Message {
    fn from(intent: Intent) -> Self {
        Message::Intent(intent)
    }
}

impl From<Notification> for Message {
    fn from(notification: Notification) -> Self {
        Message::Notification(notification)
    }
}
