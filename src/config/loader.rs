//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [network]
            required_chain_id = "0x5"
            rpc_url = "http://127.0.0.1:8545"

            [contract]
            address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            capacity = 10

            [session]
            reset_mint_on_account_switch = true
            "#,
        )
        .unwrap();

        assert_eq!(config.network.required_chain_id, "0x5");
        assert_eq!(config.contract.capacity, 10);
        assert!(config.session.reset_mint_on_account_switch);
    }

    #[test]
    fn test_validation_error_display() {
        let err = parse_config("[contract]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("capacity must be greater than zero"));
    }

    #[test]
    fn test_example_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("mint-client.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.contract.capacity, 100);
        assert_eq!(config.contract.event_grace_secs, 30);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
