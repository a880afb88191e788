//! Ledger events
//!
//! Events are immutable log records emitted by committed operations.
//! The ledger never reads them back.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};

/// Value credited to a wallet by `depositToAccount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessfulDeposit {
    pub wallet: WalletId,
    pub quantity: Amount,
}

/// Value paid out to a wallet by `extractFromAccount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessfulExtract {
    pub wallet: WalletId,
    pub quantity: Amount,
}

/// A wallet balance changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessfulBalanceUpdate {
    pub wallet: WalletId,
    pub new_balance: Amount,
}

/// Enum wrapper for all ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    SuccessfulDeposit(SuccessfulDeposit),
    SuccessfulExtract(SuccessfulExtract),
    SuccessfulBalanceUpdate(SuccessfulBalanceUpdate),
}

impl LedgerEvent {
    /// Wallet the event refers to.
    pub fn wallet(&self) -> &WalletId {
        match self {
            LedgerEvent::SuccessfulDeposit(e) => &e.wallet,
            LedgerEvent::SuccessfulExtract(e) => &e.wallet,
            LedgerEvent::SuccessfulBalanceUpdate(e) => &e.wallet,
        }
    }
}
