//! Scenario files
//!
//! A scenario is the full input of a run: ledger parameters, wallets whose
//! payouts bounce, and the ordered calls. Example:
//!
//! ```json
//! {
//!   "config": { "max_extract": 100, "bank_cap": 1000 },
//!   "rejecting_wallets": ["0xdead"],
//!   "steps": [
//!     { "caller": "alice", "op": "depositToAccount", "value": 600 },
//!     { "caller": "alice", "op": "extractFromAccount", "quantity": 80 },
//!     { "caller": "alice", "op": "getBalance" }
//!   ]
//! }
//! ```

use ledger_types::ids::WalletId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use vault_ledger::abi::Message;
use vault_ledger::config::LedgerConfig;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One call: who calls, and with which message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub caller: WalletId,
    #[serde(flatten)]
    pub message: Message,
}

impl Step {
    pub fn new(caller: WalletId, message: Message) -> Self {
        Self { caller, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub config: LedgerConfig,
    /// Wallets that refuse every payout
    #[serde(default)]
    pub rejecting_wallets: Vec<WalletId>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            rejecting_wallets: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
