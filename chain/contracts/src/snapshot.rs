//! Ledger snapshots with integrity hash
//!
//! A snapshot is a `BTreeMap`-ordered image of the ledger, so its JSON
//! encoding (and therefore its hash) is deterministic. Two ledgers that
//! went through the same sequence of calls produce the same hash.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::LedgerConfig;
use crate::errors::InvariantViolation;
use crate::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub config: LedgerConfig,
    /// Balances keyed by wallet, including wallets at zero
    pub balances: BTreeMap<WalletId, Amount>,
    pub total_deposited: Amount,
    pub successful_deposits: u64,
    pub successful_extracts: u64,
}

impl LedgerSnapshot {
    /// Hex SHA-256 of the canonical JSON encoding.
    pub fn state_hash(&self) -> String {
        let mut hasher = Sha256::new();
        // Plain maps and integers; serialization cannot fail
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        hex::encode(hasher.finalize())
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        let balances: Amount = self.balances.values().sum();
        if balances > self.total_deposited {
            return Err(InvariantViolation::BalancesExceedDeposits {
                balances,
                total_deposited: self.total_deposited,
            });
        }
        if self.total_deposited > self.config.bank_cap {
            return Err(InvariantViolation::DepositsExceedCap {
                total_deposited: self.total_deposited,
                bank_cap: self.config.bank_cap,
            });
        }
        Ok(())
    }
}

impl Ledger {
    /// Capture the current state. The event log is not part of it.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            config: *self.config(),
            balances: self
                .balances()
                .iter()
                .map(|(wallet, amount)| (wallet.clone(), *amount))
                .collect(),
            total_deposited: self.total_deposited(),
            successful_deposits: self.successful_deposits(),
            successful_extracts: self.successful_extracts(),
        }
    }

    /// Rebuild a ledger from a snapshot, rejecting images that break the
    /// balance invariants.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Ledger, InvariantViolation> {
        snapshot.validate()?;
        Ok(Ledger::from_parts(
            snapshot.config,
            snapshot.balances.into_iter().collect(),
            snapshot.total_deposited,
            snapshot.successful_deposits,
            snapshot.successful_extracts,
        ))
    }
}
