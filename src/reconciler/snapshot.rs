//! Immutable view of client state handed to the presentation layer.

use alloy::primitives::Address;
use serde::Serialize;

use crate::mint::{offers_mint, MintStatus};
use crate::session::WrongChainError;

/// A message the user has to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// No wallet extension was found on connect.
    InstallWallet,
    WrongChain(WrongChainError),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::InstallWallet => write!(f, "Get a wallet! No wallet provider was found"),
            Notice::WrongChain(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub active_address: Option<Address>,
    pub mint: MintStatus,
    pub total_minted: u64,
    pub capacity: u64,
    pub is_busy: bool,
    /// Whether the mint action is offered at all (collection not sold out).
    pub can_mint: bool,
    pub notice: Option<Notice>,
}

impl Snapshot {
    /// State at application start.
    pub fn initial(capacity: u64) -> Self {
        Self {
            active_address: None,
            mint: MintStatus::Idle,
            total_minted: 0,
            capacity,
            is_busy: false,
            can_mint: offers_mint(0, capacity),
            notice: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.active_address.is_some()
    }

    pub fn is_sold_out(&self) -> bool {
        !self.can_mint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot() {
        let snapshot = Snapshot::initial(100);
        assert!(!snapshot.is_connected());
        assert!(snapshot.can_mint);
        assert_eq!(snapshot.mint, MintStatus::Idle);
    }

    #[test]
    fn test_snapshot_json() {
        let mut snapshot = Snapshot::initial(2);
        snapshot.notice = Some(Notice::WrongChain(WrongChainError {
            expected: "0x4".into(),
            actual: "0x1".into(),
        }));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["capacity"], 2);
        assert_eq!(json["notice"]["kind"], "wrong_chain");
        assert_eq!(json["notice"]["expected"], "0x4");
    }
}
