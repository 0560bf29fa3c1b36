//! Client metrics.
//!
//! # Metrics
//! - `mint_client_intents_total` (counter): intents received, by intent
//! - `mint_notifications_total` (counter): wallet and contract notifications, by kind
//! - `mint_attempts_total` (counter): resolved mint attempts, by outcome
//! - `mint_counter_refresh_total` (counter): counter reads, by result
//! - `mint_total_minted` (gauge): last total read from the contract
//! - `mint_active_listeners` (gauge): attached listeners

use metrics::{counter, gauge};

pub fn record_intent(intent: &'static str) {
    counter!("mint_client_intents_total", "intent" => intent).increment(1);
}

pub fn record_notification(kind: &'static str) {
    counter!("mint_notifications_total", "kind" => kind).increment(1);
}

pub fn record_mint_outcome(outcome: &'static str) {
    counter!("mint_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_counter_refresh(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("mint_counter_refresh_total", "result" => result).increment(1);
}

pub fn set_total_minted(total: u64) {
    gauge!("mint_total_minted").set(total as f64);
}

pub fn set_active_listeners(count: usize) {
    gauge!("mint_active_listeners").set(count as f64);
}
