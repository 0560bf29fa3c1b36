//! Network gate for chain-dependent operations.
//!
//! The comparison is a literal string match on the id the wallet reports.
//! The guard never switches networks itself; a mismatch is surfaced to the
//! user and fails the guarded operation only.

use serde::Serialize;
use thiserror::Error;

use crate::gateway::{ChainGateway, ChainId, ProviderError, WalletProvider};

/// The wallet is on a different network than the collection.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("You are not connected to the required network (expected {expected}, wallet is on {actual})")]
pub struct WrongChainError {
    pub expected: ChainId,
    pub actual: ChainId,
}

/// Why verification did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error(transparent)]
    WrongChain(#[from] WrongChainError),

    /// The chain id could not be read at all.
    #[error("Could not read chain id: {0}")]
    Provider(#[from] ProviderError),
}

/// Compares the wallet's chain against the one the collection lives on.
#[derive(Debug, Clone)]
pub struct ChainGuard {
    required: ChainId,
}

impl ChainGuard {
    pub fn new(required: impl Into<ChainId>) -> Self {
        Self {
            required: required.into(),
        }
    }

    pub fn required(&self) -> &ChainId {
        &self.required
    }

    /// Pure comparison.
    pub fn check(&self, current: &ChainId) -> Result<(), WrongChainError> {
        if *current == self.required {
            Ok(())
        } else {
            Err(WrongChainError {
                expected: self.required.clone(),
                actual: current.clone(),
            })
        }
    }

    /// Read the wallet's chain and compare.
    pub async fn verify<W: WalletProvider>(
        &self,
        gateway: &ChainGateway<W>,
    ) -> Result<ChainId, GuardError> {
        let current = gateway.current_chain_id().await?;
        match self.check(&current) {
            Ok(()) => {
                tracing::debug!(chain_id = %current, "Chain verified");
                Ok(current)
            }
            Err(e) => {
                tracing::warn!(
                    expected = %e.expected,
                    actual = %e.actual,
                    "Wallet is on the wrong network"
                );
                Err(e.into())
            }
        }
    }
}
