//! Outbound value movement
//!
//! The ledger never moves value itself. Extraction hands the payout to a
//! `ValueTransfer`, passing the ledger back in so that a recipient may
//! re-enter it exactly as a contract recipient could on-chain.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::errors::TransferError;
use crate::ledger::Ledger;

/// Moves value out of the vault to a wallet.
///
/// Returning `Err` makes the enclosing extraction fail with
/// `TransferFailed` and undoes everything it did.
pub trait ValueTransfer {
    fn transfer(
        &mut self,
        ledger: &mut Ledger,
        to: &WalletId,
        amount: Amount,
    ) -> Result<(), TransferError>;
}

/// In-memory payout sink.
///
/// Records how much each wallet received. Wallets marked as rejecting
/// refuse every incoming transfer.
#[derive(Debug, Clone, Default)]
pub struct Treasury {
    paid: BTreeMap<WalletId, Amount>,
    rejecting: HashSet<WalletId>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a treasury whose given wallets refuse incoming value.
    pub fn with_rejecting(wallets: impl IntoIterator<Item = WalletId>) -> Self {
        Self {
            paid: BTreeMap::new(),
            rejecting: wallets.into_iter().collect(),
        }
    }

    /// Make `wallet` refuse incoming value.
    pub fn reject_from(&mut self, wallet: WalletId) {
        self.rejecting.insert(wallet);
    }

    /// Make `wallet` accept incoming value again.
    pub fn accept_from(&mut self, wallet: &WalletId) {
        self.rejecting.remove(wallet);
    }

    pub fn paid_to(&self, wallet: &WalletId) -> Amount {
        self.paid.get(wallet).copied().unwrap_or(Amount::ZERO)
    }

    pub fn total_paid(&self) -> Amount {
        self.paid.values().sum()
    }

    pub fn payouts(&self) -> &BTreeMap<WalletId, Amount> {
        &self.paid
    }
}

impl ValueTransfer for Treasury {
    fn transfer(
        &mut self,
        _ledger: &mut Ledger,
        to: &WalletId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            return Err(TransferError::Rejected { wallet: to.clone() });
        }

        let received = self.paid.entry(to.clone()).or_insert(Amount::ZERO);
        *received = received
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow { wallet: to.clone() })?;

        debug!(wallet = %to, amount = %amount, "Payout sent");
        Ok(())
    }
}
