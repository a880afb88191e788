//! Ledger error types
//!
//! `Reason` is the closed set of rejection causes. Every rejected operation
//! surfaces as one of the two failure signals, `FailedDeposit` or
//! `FailedExtract`, carrying the wallet, the quantity and the reason.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why an operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Reason {
    /// Deposit of zero value
    ZeroAmount,
    /// Deposit would push cumulative intake above the bank cap
    CapExceeded,
    /// Withdrawal above the per-call ceiling
    ExceedsMaxWithdraw,
    /// Withdrawal above the caller's balance
    InsufficientBalance,
    /// Outbound value transfer to the caller did not complete
    TransferFailed,
    /// Value arrived without a recognized operation
    DirectTransferNotAllowed,
}

impl Reason {
    /// Human-readable reason string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::ZeroAmount => "deposit amount must be greater than zero",
            Reason::CapExceeded => "deposit would exceed the bank cap",
            Reason::ExceedsMaxWithdraw => "quantity exceeds the maximum allowed per extraction",
            Reason::InsufficientBalance => "insufficient balance",
            Reason::TransferFailed => "transfer to wallet failed",
            Reason::DirectTransferNotAllowed => {
                "direct transfers are not allowed, use depositToAccount"
            }
        }
    }
}

impl Reason {
    /// Stable identifier, e.g. for metrics keys.
    pub fn code(&self) -> &'static str {
        match self {
            Reason::ZeroAmount => "ZeroAmount",
            Reason::CapExceeded => "CapExceeded",
            Reason::ExceedsMaxWithdraw => "ExceedsMaxWithdraw",
            Reason::InsufficientBalance => "InsufficientBalance",
            Reason::TransferFailed => "TransferFailed",
            Reason::DirectTransferNotAllowed => "DirectTransferNotAllowed",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure signals returned by ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("FailedDeposit: wallet {wallet}, quantity {quantity}: {reason}")]
    FailedDeposit {
        wallet: WalletId,
        quantity: Amount,
        reason: Reason,
    },

    #[error("FailedExtract: wallet {wallet}, quantity {quantity}: {reason}")]
    FailedExtract {
        wallet: WalletId,
        quantity: Amount,
        reason: Reason,
    },
}

impl LedgerError {
    pub fn reason(&self) -> Reason {
        match self {
            LedgerError::FailedDeposit { reason, .. } | LedgerError::FailedExtract { reason, .. } => {
                *reason
            }
        }
    }

    pub fn wallet(&self) -> &WalletId {
        match self {
            LedgerError::FailedDeposit { wallet, .. } | LedgerError::FailedExtract { wallet, .. } => {
                wallet
            }
        }
    }

    pub fn quantity(&self) -> Amount {
        match self {
            LedgerError::FailedDeposit { quantity, .. }
            | LedgerError::FailedExtract { quantity, .. } => *quantity,
        }
    }
}

/// Outbound transfer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Recipient {wallet} rejected the transfer")]
    Rejected { wallet: WalletId },

    #[error("Recipient {wallet} payout overflow")]
    Overflow { wallet: WalletId },

    #[error("Nested ledger call failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing environment variable: {name}")]
    MissingEnv { name: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Ledger invariant violated by a state image (live ledger or snapshot)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Balances sum {balances} exceeds total deposited {total_deposited}")]
    BalancesExceedDeposits {
        balances: Amount,
        total_deposited: Amount,
    },

    #[error("Total deposited {total_deposited} exceeds bank cap {bank_cap}")]
    DepositsExceedCap {
        total_deposited: Amount,
        bank_cap: Amount,
    },
}
