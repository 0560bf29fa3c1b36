//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work (unparsable addresses, zero capacities, non-hex chain ids).

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("contract.address '{0}' is not a valid address")]
    InvalidContractAddress(String),

    #[error("contract.capacity must be greater than zero")]
    ZeroCapacity,

    #[error("network.required_chain_id '{0}' must be a 0x-prefixed hex string")]
    InvalidChainId(String),

    #[error("network.rpc_url '{0}' is not a valid URL")]
    InvalidRpcUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.contract.address.parse::<Address>().is_err() {
        errors.push(ValidationError::InvalidContractAddress(
            config.contract.address.clone(),
        ));
    }

    if config.contract.capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }

    let chain_id = &config.network.required_chain_id;
    let digits = chain_id.strip_prefix("0x").unwrap_or("");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        errors.push(ValidationError::InvalidChainId(chain_id.clone()));
    }

    if config.network.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::InvalidRpcUrl(config.network.rpc_url.clone()));
    }

    let durations = [
        ("network.rpc_timeout_secs", config.network.rpc_timeout_secs),
        ("network.poll_interval_ms", config.network.poll_interval_ms),
        ("contract.confirmation_timeout_secs", config.contract.confirmation_timeout_secs),
        ("contract.event_grace_secs", config.contract.event_grace_secs),
    ];
    for (name, value) in durations {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.contract.address = "not-an-address".into();
        config.contract.capacity = 0;
        config.network.required_chain_id = "4".into();
        config.contract.event_grace_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroCapacity));
        assert!(errors.contains(&ValidationError::InvalidChainId("4".into())));
        assert!(errors.contains(&ValidationError::ZeroDuration("contract.event_grace_secs")));
    }

    #[test]
    fn test_chain_id_needs_hex_digits() {
        let mut config = ClientConfig::default();
        config.network.required_chain_id = "0x".into();
        assert!(validate_config(&config).is_err());

        config.network.required_chain_id = "0xzz".into();
        assert!(validate_config(&config).is_err());

        config.network.required_chain_id = "0x04".into();
        assert!(validate_config(&config).is_ok());
    }
}
