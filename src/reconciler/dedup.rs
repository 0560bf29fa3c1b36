//! Token ids already handled, so a replayed mint event is applied once.

use alloy::primitives::U256;
use std::collections::{HashSet, VecDeque};

/// Insertion-ordered set of token ids with a fixed limit.
///
/// Token ids are unique within a collection, so a well-behaved contract
/// never produces more than `capacity` of them. The limit only matters for a
/// source that misreports ids; the oldest are evicted first.
#[derive(Debug)]
pub struct SeenTokens {
    order: VecDeque<U256>,
    set: HashSet<U256>,
    limit: usize,
}

impl SeenTokens {
    pub fn new(capacity: u64) -> Self {
        Self {
            order: VecDeque::new(),
            set: HashSet::new(),
            limit: usize::try_from(capacity).unwrap_or(usize::MAX).max(1),
        }
    }

    /// Record `token_id`. Returns false if it was already recorded.
    pub fn insert(&mut self, token_id: U256) -> bool {
        if !self.set.insert(token_id) {
            return false;
        }
        self.order.push_back(token_id);
        while self.order.len() > self.limit {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, token_id: &U256) -> bool {
        self.set.contains(token_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_rejected() {
        let mut seen = SeenTokens::new(10);
        assert!(seen.insert(U256::from(1)));
        assert!(!seen.insert(U256::from(1)));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut seen = SeenTokens::new(2);
        seen.insert(U256::from(1));
        seen.insert(U256::from(2));
        seen.insert(U256::from(3));

        assert_eq!(seen.len(), 2);
        assert!(!seen.contains(&U256::from(1)));
        assert!(seen.contains(&U256::from(3)));
    }
}
