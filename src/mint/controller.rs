//! Mint attempt state machine.
//!
//! # State Transitions
//! ```text
//! Idle → Submitting: chain verified
//! Idle → Failed: not connected / wrong chain
//! Submitting → AwaitingConfirmation(tx): wallet accepted the transaction
//! Submitting → Failed(Submission): wallet or contract rejected it
//! AwaitingConfirmation → Succeeded(token): mint event for our address
//! AwaitingConfirmation → Failed(Inclusion): reverted, dropped, timed out
//! AwaitingConfirmation → Succeeded/Failed(MissingEvent): included, event
//!     grace period elapsed (fallback to the receipt)
//! Succeeded/Failed → Idle: next mint intent
//! ```
//!
//! Only one attempt exists at a time. While it is busy every new mint
//! intent is refused; an attempt cannot be cancelled, only resolved.

use alloy::primitives::{TxHash, U256};

use crate::gateway::Inclusion;
use crate::mint::types::{MintFailure, MintStatus};

/// Identifies one attempt so late completions for older attempts are
/// recognised as stale.
pub type AttemptId = u64;

/// What an inclusion result meant for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionOutcome {
    /// Included; the token id is still expected from the mint event.
    AwaitingEvent,
    /// The mint event already resolved the attempt.
    AlreadyResolved,
    /// The attempt failed.
    Failed,
    /// Belongs to an older attempt.
    Stale,
}

#[derive(Debug, Default)]
pub struct MintController {
    id: AttemptId,
    status: MintStatus,
    busy: bool,
    included: bool,
    receipt_token: Option<U256>,
}

impl MintController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &MintStatus {
        &self.status
    }

    pub fn attempt_id(&self) -> AttemptId {
        self.id
    }

    /// True from the moment an attempt is accepted until it resolves.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.status, MintStatus::AwaitingConfirmation(_))
    }

    /// Start a new attempt, clearing whatever the previous one displayed.
    /// Returns `None` while an attempt is still in flight.
    pub fn begin(&mut self) -> Option<AttemptId> {
        if self.busy {
            tracing::debug!(attempt = self.id, "Mint already in progress, ignoring intent");
            return None;
        }
        self.id += 1;
        self.status = MintStatus::Idle;
        self.busy = true;
        self.included = false;
        self.receipt_token = None;
        Some(self.id)
    }

    fn is_current(&self, id: AttemptId) -> bool {
        self.busy && self.id == id
    }

    pub fn mark_submitting(&mut self, id: AttemptId) {
        if self.is_current(id) {
            self.status = MintStatus::Submitting;
        }
    }

    pub fn mark_submitted(&mut self, id: AttemptId, tx_hash: TxHash) {
        if self.is_current(id) {
            tracing::info!(attempt = id, tx_hash = %tx_hash, "Mining, please wait");
            self.status = MintStatus::AwaitingConfirmation(tx_hash);
        }
    }

    /// Resolve the attempt as failed. Returns false for stale ids.
    pub fn fail(&mut self, id: AttemptId, failure: MintFailure) -> bool {
        if !self.is_current(id) {
            return false;
        }
        tracing::warn!(attempt = id, reason = %failure, "Mint failed");
        self.status = MintStatus::Failed(failure);
        self.busy = false;
        true
    }

    /// Apply the result of waiting for inclusion.
    pub fn on_inclusion(
        &mut self,
        id: AttemptId,
        result: Result<&Inclusion, MintFailure>,
    ) -> InclusionOutcome {
        if self.id != id {
            return InclusionOutcome::Stale;
        }
        let resolved = matches!(self.status, MintStatus::Succeeded(_));
        match result {
            Ok(inclusion) if self.is_awaiting() => {
                tracing::info!(
                    attempt = id,
                    tx_hash = %inclusion.tx_hash,
                    block = inclusion.block_number,
                    "Mined"
                );
                self.included = true;
                self.receipt_token = inclusion.token_id;
                InclusionOutcome::AwaitingEvent
            }
            Ok(_) if resolved => InclusionOutcome::AlreadyResolved,
            Err(failure) if self.is_awaiting() => {
                self.fail(id, failure);
                InclusionOutcome::Failed
            }
            _ => InclusionOutcome::Stale,
        }
    }

    /// Resolve an awaiting attempt from the mint event. Returns false when
    /// no attempt is awaiting, or when the attempt is included and its
    /// receipt names a different token.
    pub fn resolve(&mut self, token_id: U256) -> bool {
        if !self.is_awaiting() {
            return false;
        }
        if let Some(expected) = self.receipt_token.filter(|_| self.included) {
            if expected != token_id {
                tracing::debug!(
                    attempt = self.id,
                    expected = %expected,
                    token_id = %token_id,
                    "Mint event does not match receipt"
                );
                return false;
            }
        }
        tracing::info!(attempt = self.id, token_id = %token_id, "Minted");
        self.status = MintStatus::Succeeded(token_id);
        self.busy = false;
        true
    }

    /// The mint event did not arrive in time after inclusion: fall back to
    /// the token id decoded from the receipt, or fail.
    pub fn on_event_grace_elapsed(&mut self, id: AttemptId) -> bool {
        if self.id != id || !self.is_awaiting() || !self.included {
            return false;
        }
        match self.receipt_token {
            Some(token_id) => {
                tracing::warn!(attempt = id, token_id = %token_id, "Mint event missed, using receipt");
                self.status = MintStatus::Succeeded(token_id);
                self.busy = false;
            }
            None => {
                self.fail(id, MintFailure::MissingEvent);
            }
        }
        true
    }

    /// Drop a finished attempt's display. In-flight attempts are untouched.
    pub fn clear_display(&mut self) {
        if !self.busy && self.status.is_terminal() {
            self.status = MintStatus::Idle;
        }
    }
}
