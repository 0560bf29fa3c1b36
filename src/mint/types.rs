//! Mint attempt states and failure reasons.

use alloy::primitives::{TxHash, U256};
use serde::Serialize;
use thiserror::Error;

use crate::gateway::ProviderError;
use crate::session::WrongChainError;

/// Where the current mint attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum MintStatus {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation(TxHash),
    Succeeded(U256),
    Failed(MintFailure),
}

impl MintStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MintStatus::Succeeded(_) | MintStatus::Failed(_))
    }

    pub fn token_id(&self) -> Option<U256> {
        match self {
            MintStatus::Succeeded(token_id) => Some(*token_id),
            _ => None,
        }
    }
}

/// Why a mint attempt failed. Provider errors are kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum MintFailure {
    #[error("No wallet connected")]
    NotConnected,

    #[error("No wallet provider found")]
    NoProvider,

    #[error(transparent)]
    WrongChain(WrongChainError),

    #[error("Could not verify network: {0}")]
    Verification(ProviderError),

    #[error("Mint submission failed: {0}")]
    Submission(ProviderError),

    #[error("Mint transaction not included: {0}")]
    Inclusion(ProviderError),

    #[error("Mint transaction included but no mint event was observed")]
    MissingEvent,
}

impl MintFailure {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MintFailure::NotConnected => "not_connected",
            MintFailure::NoProvider => "no_provider",
            MintFailure::WrongChain(_) => "wrong_chain",
            MintFailure::Verification(_) => "verification",
            MintFailure::Submission(_) => "submission",
            MintFailure::Inclusion(_) => "inclusion",
            MintFailure::MissingEvent => "missing_event",
        }
    }
}
