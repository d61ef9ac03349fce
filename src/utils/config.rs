use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::Deserialize;

use crate::utils::error::{AggregatorError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    pub contact: ContactConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
    /// Timeout applied to every outbound call to a plugin; expiry is
    /// reported as unreachability, same as a refused connection.
    pub request_timeout: u64,
    /// Whether plugins are contacted over https. Certificate material is
    /// provisioned by the deployment, not loaded here.
    pub secure: bool,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Key material for the credential vault; device passwords are only
    /// ever persisted encrypted under a key derived from this.
    pub vault_key: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        let config = ConfigLib::builder()
            // Start with default values
            .set_default("node.host", "0.0.0.0")?
            .set_default("node.port", 45001)?
            .set_default("node.log_level", "info")?
            .set_default("storage.path", "data/registry")?
            .set_default("contact.request_timeout", 30)?
            .set_default("contact.secure", true)?
            .set_default("contact.accept_invalid_certs", false)?
            // Load from config file
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (e.g., APP_NODE_HOST)
            .add_source(Environment::with_prefix("APP").separator("_"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.node.port == 0 {
            return Err(AggregatorError::Config("Invalid port number".into()));
        }
        if self.storage.path.is_empty() {
            return Err(AggregatorError::Config("storage.path must be set".into()));
        }
        if self.contact.request_timeout == 0 {
            return Err(AggregatorError::Config(
                "contact.request_timeout must be greater than 0".into(),
            ));
        }
        if self.security.vault_key.is_empty() {
            return Err(AggregatorError::Config("security.vault_key must be set".into()));
        }

        Ok(())
    }
}

impl From<ConfigError> for AggregatorError {
    fn from(error: ConfigError) -> Self {
        AggregatorError::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            node: NodeConfig {
                host: "127.0.0.1".into(),
                port: 45001,
                log_level: "info".into(),
            },
            storage: StorageConfig {
                path: "data/registry".into(),
            },
            contact: ContactConfig {
                request_timeout: 30,
                secure: true,
                accept_invalid_certs: false,
            },
            security: SecurityConfig {
                vault_key: "test-vault-key".into(),
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = base_config();
        config.contact.request_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_vault_key_rejected() {
        let mut config = base_config();
        config.security.vault_key = String::new();
        assert!(config.validate().is_err());
    }
}
