//! Collection counter: how many items exist versus how many can.
//!
//! The counter is only ever set from a contract read, never incremented
//! locally.

use alloy::primitives::U256;
use thiserror::Error;

use crate::gateway::{MintContract, ProviderError};

/// Whether the mint action should be offered. Independent of any attempt in
/// flight.
pub fn offers_mint(total_minted: u64, capacity: u64) -> bool {
    total_minted < capacity
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterRefreshError {
    #[error("Could not read total minted: {0}")]
    Provider(#[from] ProviderError),

    #[error("Contract reported {total} minted, above capacity {capacity}")]
    OutOfRange { total: U256, capacity: u64 },

    #[error("No active account to read the counter with")]
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionCounter {
    total_minted: u64,
    capacity: u64,
}

impl CollectionCounter {
    pub fn new(capacity: u64) -> Self {
        Self {
            total_minted: 0,
            capacity,
        }
    }

    pub fn total_minted(&self) -> u64 {
        self.total_minted
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn offers_mint(&self) -> bool {
        offers_mint(self.total_minted, self.capacity)
    }

    /// Accept a value read from the contract if it respects
    /// `0 <= total <= capacity`; otherwise keep the previous value.
    pub fn apply(&mut self, total: U256) -> Result<u64, CounterRefreshError> {
        if total > U256::from(self.capacity) {
            return Err(CounterRefreshError::OutOfRange {
                total,
                capacity: self.capacity,
            });
        }
        self.total_minted = total.to::<u64>();
        Ok(self.total_minted)
    }

    /// Re-read the total from the contract.
    pub async fn refresh<C: MintContract>(&mut self, contract: &C) -> Result<u64, CounterRefreshError> {
        let total = contract.total_minted().await?;
        let total = self.apply(total)?;
        tracing::info!(total_minted = total, capacity = self.capacity, "Retrieved total number minted");
        Ok(total)
    }
}
