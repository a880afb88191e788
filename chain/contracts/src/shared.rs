//! Serialized access from many threads
//!
//! A single mutex around the ledger gives the one-call-at-a-time execution
//! the ledger assumes. Calls from different threads never interleave.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::abi::{Message, Receipt};
use crate::errors::LedgerError;
use crate::ledger::Ledger;
use crate::snapshot::LedgerSnapshot;
use crate::transfer::ValueTransfer;

#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run one call while holding the lock.
    pub fn invoke<T>(
        &self,
        caller: &WalletId,
        message: Message,
        transfer: &mut T,
    ) -> Result<Receipt, LedgerError>
    where
        T: ValueTransfer + ?Sized,
    {
        self.lock().invoke(caller, message, transfer)
    }

    pub fn get_balance(&self, caller: &WalletId) -> Amount {
        self.lock().get_balance(caller)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().snapshot()
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.lock())
    }

    // Ledger calls commit or roll back before returning, and a panicking
    // recipient is turned into `TransferFailed` inside the call. A poisoned
    // lock therefore means a panic between calls, with the state intact.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
