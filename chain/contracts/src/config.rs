//! Ledger construction parameters
//!
//! Both values are fixed for the lifetime of a `Ledger`.

use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ConfigError;

pub const ENV_MAX_EXTRACT: &str = "VAULT_MAX_EXTRACT";
pub const ENV_BANK_CAP: &str = "VAULT_BANK_CAP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum quantity a single `extractFromAccount` call may move
    pub max_extract: Amount,
    /// Maximum cumulative deposit volume the ledger will ever accept
    pub bank_cap: Amount,
}

impl LedgerConfig {
    pub fn new(max_extract: impl Into<Amount>, bank_cap: impl Into<Amount>) -> Self {
        Self {
            max_extract: max_extract.into(),
            bank_cap: bank_cap.into(),
        }
    }

    /// Parse a config from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Read `VAULT_MAX_EXTRACT` and `VAULT_BANK_CAP` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| -> Result<Amount, ConfigError> {
            let value = lookup(name).ok_or_else(|| ConfigError::MissingEnv {
                name: name.to_string(),
            })?;
            value
                .trim()
                .parse::<u128>()
                .map(Amount::new)
                .map_err(|_| ConfigError::InvalidValue {
                    name: name.to_string(),
                    value,
                })
        };

        Ok(Self {
            max_extract: read(ENV_MAX_EXTRACT)?,
            bank_cap: read(ENV_BANK_CAP)?,
        })
    }
}
