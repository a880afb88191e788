//! Ledger — capped deposits, bounded extractions, per-wallet balances
//!
//! Every mutating call is atomic. State writes go through an undo journal;
//! a failing call (including one nested inside another call's transfer
//! step) replays its journal entries in reverse and truncates the event
//! log, so no partial effect is ever visible afterwards.
//!
//! Extraction follows checks-effects-interactions: all guards run first,
//! the balance is written next, and the outbound transfer happens last.
//! The transfer receives `&mut Ledger`, so a recipient calling back in
//! observes the already-reduced balance.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::errors::{InvariantViolation, LedgerError, Reason};
use crate::events::{LedgerEvent, SuccessfulBalanceUpdate, SuccessfulDeposit, SuccessfulExtract};
use crate::transfer::ValueTransfer;

/// Previous value of one piece of state, restored on rollback.
#[derive(Debug, Clone)]
enum Undo {
    Balance {
        wallet: WalletId,
        previous: Option<Amount>,
    },
    TotalDeposited(Amount),
    SuccessfulDeposits(u64),
    SuccessfulExtracts(u64),
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    journal_len: usize,
    events_len: usize,
}

/// Single-asset custodial ledger.
#[derive(Debug)]
pub struct Ledger {
    config: LedgerConfig,
    /// Balances: wallet -> amount. Entries are never removed.
    balances: HashMap<WalletId, Amount>,
    /// Cumulative sum of accepted deposits, never decremented
    total_deposited: Amount,
    successful_deposits: u64,
    successful_extracts: u64,
    /// Emitted events log (append-only outside of rollback)
    events: Vec<LedgerEvent>,
    journal: Vec<Undo>,
    /// Nesting depth of in-flight calls
    depth: usize,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        info!(
            max_extract = %config.max_extract,
            bank_cap = %config.bank_cap,
            "Ledger initialized"
        );

        Self {
            config,
            balances: HashMap::new(),
            total_deposited: Amount::ZERO,
            successful_deposits: 0,
            successful_extracts: 0,
            events: Vec::new(),
            journal: Vec::new(),
            depth: 0,
        }
    }

    /// Rebuild a ledger from trusted parts. Used by snapshot restore.
    pub(crate) fn from_parts(
        config: LedgerConfig,
        balances: HashMap<WalletId, Amount>,
        total_deposited: Amount,
        successful_deposits: u64,
        successful_extracts: u64,
    ) -> Self {
        Self {
            config,
            balances,
            total_deposited,
            successful_deposits,
            successful_extracts,
            events: Vec::new(),
            journal: Vec::new(),
            depth: 0,
        }
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Credit `value`, already attached to the call, to `caller`.
    ///
    /// Guards, in order: value is non-zero, cumulative intake stays within
    /// the bank cap. Emits `SuccessfulBalanceUpdate` then `SuccessfulDeposit`.
    pub fn deposit_to_account(&mut self, caller: &WalletId, value: Amount) -> Result<(), LedgerError> {
        self.atomically(|ledger| ledger.apply_deposit(caller, value))
    }

    fn apply_deposit(&mut self, caller: &WalletId, value: Amount) -> Result<(), LedgerError> {
        let reject = |reason| LedgerError::FailedDeposit {
            wallet: caller.clone(),
            quantity: value,
            reason,
        };

        if value.is_zero() {
            return Err(reject(Reason::ZeroAmount));
        }

        // u128 overflow means the true sum is above any cap
        let new_total = self
            .total_deposited
            .checked_add(value)
            .filter(|total| *total <= self.config.bank_cap)
            .ok_or_else(|| reject(Reason::CapExceeded))?;

        // Bounded by new_total, so this cannot overflow
        let new_balance = self
            .get_balance(caller)
            .checked_add(value)
            .ok_or_else(|| reject(Reason::CapExceeded))?;

        self.set_total_deposited(new_total);
        self.set_successful_deposits(self.successful_deposits + 1);
        self.set_balance(caller, new_balance);

        self.emit(LedgerEvent::SuccessfulBalanceUpdate(SuccessfulBalanceUpdate {
            wallet: caller.clone(),
            new_balance,
        }));
        self.emit(LedgerEvent::SuccessfulDeposit(SuccessfulDeposit {
            wallet: caller.clone(),
            quantity: value,
        }));

        info!(wallet = %caller, quantity = %value, balance = %new_balance, "Deposit accepted");
        Ok(())
    }

    // ───────────────────────── Extract ─────────────────────────

    /// Pay `quantity` out of `caller`'s balance through `transfer`.
    ///
    /// Guards, in order: quantity within the per-call ceiling, quantity
    /// within the balance. The balance is written before the transfer;
    /// a failed or panicking transfer rolls the whole call back with
    /// `TransferFailed`.
    pub fn extract_from_account<T>(
        &mut self,
        caller: &WalletId,
        quantity: Amount,
        transfer: &mut T,
    ) -> Result<(), LedgerError>
    where
        T: ValueTransfer + ?Sized,
    {
        self.atomically(|ledger| ledger.apply_extract(caller, quantity, transfer))
    }

    fn apply_extract<T>(
        &mut self,
        caller: &WalletId,
        quantity: Amount,
        transfer: &mut T,
    ) -> Result<(), LedgerError>
    where
        T: ValueTransfer + ?Sized,
    {
        let reject = |reason| LedgerError::FailedExtract {
            wallet: caller.clone(),
            quantity,
            reason,
        };

        if quantity > self.config.max_extract {
            return Err(reject(Reason::ExceedsMaxWithdraw));
        }

        let new_balance = self
            .get_balance(caller)
            .checked_sub(quantity)
            .ok_or_else(|| reject(Reason::InsufficientBalance))?;

        // Effects
        self.set_balance(caller, new_balance);
        self.set_successful_extracts(self.successful_extracts + 1);
        self.emit(LedgerEvent::SuccessfulBalanceUpdate(SuccessfulBalanceUpdate {
            wallet: caller.clone(),
            new_balance,
        }));

        // Interaction. A panicking recipient counts as a failed transfer so
        // the journal still unwinds and `depth` stays balanced.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| transfer.transfer(self, caller, quantity)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(wallet = %caller, quantity = %quantity, error = %err, "Outbound transfer failed");
                return Err(reject(Reason::TransferFailed));
            }
            Err(_) => {
                warn!(wallet = %caller, quantity = %quantity, "Outbound transfer panicked");
                return Err(reject(Reason::TransferFailed));
            }
        }

        self.emit(LedgerEvent::SuccessfulExtract(SuccessfulExtract {
            wallet: caller.clone(),
            quantity,
        }));

        info!(wallet = %caller, quantity = %quantity, balance = %new_balance, "Extract completed");
        Ok(())
    }

    // ───────────────────────── Direct receipt ─────────────────────────

    /// Value sent without selecting an operation. Always rejected.
    pub fn receive(&mut self, caller: &WalletId, value: Amount) -> Result<(), LedgerError> {
        let err = LedgerError::FailedDeposit {
            wallet: caller.clone(),
            quantity: value,
            reason: Reason::DirectTransferNotAllowed,
        };
        warn!(wallet = %caller, quantity = %value, reason = %err.reason(), "Direct transfer rejected");
        Err(err)
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Balance of `caller`, zero if never touched.
    pub fn get_balance(&self, caller: &WalletId) -> Amount {
        self.balances.get(caller).copied().unwrap_or(Amount::ZERO)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn successful_deposits(&self) -> u64 {
        self.successful_deposits
    }

    pub fn successful_extracts(&self) -> u64 {
        self.successful_extracts
    }

    /// Number of wallets ever credited.
    pub fn wallet_count(&self) -> usize {
        self.balances.len()
    }

    /// Sum of all wallet balances.
    pub fn total_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    pub(crate) fn balances(&self) -> &HashMap<WalletId, Amount> {
        &self.balances
    }

    /// Verify `sum(balances) <= total_deposited <= bank_cap`.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let balances = self.total_balances();
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

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    ///
    /// Draining from inside a transfer callback would break rollback of the
    /// enclosing call, so it is a no-op while a call is in flight.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        if self.depth > 0 {
            return Vec::new();
        }
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    // ───────────────────────── Journal ─────────────────────────

    fn atomically<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let checkpoint = Checkpoint {
            journal_len: self.journal.len(),
            events_len: self.events.len(),
        };

        self.depth += 1;
        let result = op(self);
        self.depth -= 1;

        match result {
            Ok(value) => {
                // Nested commits stay journaled until the outermost call commits
                if self.depth == 0 {
                    self.journal.clear();
                }
                Ok(value)
            }
            Err(err) => {
                self.rollback(checkpoint);
                warn!(
                    wallet = %err.wallet(),
                    quantity = %err.quantity(),
                    reason = %err.reason(),
                    "Operation rejected"
                );
                Err(err)
            }
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.len() - checkpoint.journal_len;
        while self.journal.len() > checkpoint.journal_len {
            match self.journal.pop() {
                Some(Undo::Balance { wallet, previous }) => match previous {
                    Some(amount) => {
                        self.balances.insert(wallet, amount);
                    }
                    None => {
                        self.balances.remove(&wallet);
                    }
                },
                Some(Undo::TotalDeposited(amount)) => self.total_deposited = amount,
                Some(Undo::SuccessfulDeposits(count)) => self.successful_deposits = count,
                Some(Undo::SuccessfulExtracts(count)) => self.successful_extracts = count,
                None => break,
            }
        }
        self.events.truncate(checkpoint.events_len);
        debug!(undone, "Rolled back state changes");
    }

    fn set_balance(&mut self, wallet: &WalletId, amount: Amount) {
        let previous = self.balances.insert(wallet.clone(), amount);
        self.journal.push(Undo::Balance {
            wallet: wallet.clone(),
            previous,
        });
    }

    fn set_total_deposited(&mut self, amount: Amount) {
        self.journal.push(Undo::TotalDeposited(self.total_deposited));
        self.total_deposited = amount;
    }

    fn set_successful_deposits(&mut self, count: u64) {
        self.journal.push(Undo::SuccessfulDeposits(self.successful_deposits));
        self.successful_deposits = count;
    }

    fn set_successful_extracts(&mut self, count: u64) {
        self.journal.push(Undo::SuccessfulExtracts(self.successful_extracts));
        self.successful_extracts = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransferError;
    use crate::transfer::Treasury;

    fn setup_ledger() -> Ledger {
        Ledger::new(LedgerConfig::new(100u64, 1000u64))
    }

    fn wallet(name: &str) -> WalletId {
        WalletId::from(name)
    }

    fn amt(units: u128) -> Amount {
        Amount::new(units)
    }

    /// Transfer that always fails after the balance was written.
    struct FailingTransfer;

    impl ValueTransfer for FailingTransfer {
        fn transfer(
            &mut self,
            _ledger: &mut Ledger,
            to: &WalletId,
            _amount: Amount,
        ) -> Result<(), TransferError> {
            Err(TransferError::Rejected { wallet: to.clone() })
        }
    }

    // ─── Deposit tests ───

    #[test]
    fn test_deposit_success() {
        let mut ledger = setup_ledger();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(600)).unwrap();

        assert_eq!(ledger.get_balance(&alice), amt(600));
        assert_eq!(ledger.total_deposited(), amt(600));
        assert_eq!(ledger.successful_deposits(), 1);
    }

    #[test]
    fn test_deposit_cap_exceeded() {
        let mut ledger = setup_ledger();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(600)).unwrap();
        let err = ledger.deposit_to_account(&alice, amt(500)).unwrap_err();

        assert_eq!(
            err,
            LedgerError::FailedDeposit {
                wallet: alice.clone(),
                quantity: amt(500),
                reason: Reason::CapExceeded,
            }
        );
        assert_eq!(ledger.get_balance(&alice), amt(600));
        assert_eq!(ledger.total_deposited(), amt(600));
        assert_eq!(ledger.successful_deposits(), 1);
    }

    #[test]
    fn test_deposit_exactly_to_cap() {
        let mut ledger = setup_ledger();
        ledger.deposit_to_account(&wallet("alice"), amt(400)).unwrap();
        ledger.deposit_to_account(&wallet("bob"), amt(600)).unwrap();
        assert_eq!(ledger.total_deposited(), amt(1000));

        let err = ledger.deposit_to_account(&wallet("carol"), amt(1)).unwrap_err();
        assert_eq!(err.reason(), Reason::CapExceeded);
    }

    #[test]
    fn test_deposit_zero_amount() {
        let mut ledger = setup_ledger();
        let err = ledger.deposit_to_account(&wallet("alice"), Amount::ZERO).unwrap_err();
        assert_eq!(err.reason(), Reason::ZeroAmount);
        assert_eq!(ledger.wallet_count(), 0);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_zero_amount_checked_before_cap() {
        let mut ledger = Ledger::new(LedgerConfig::new(100u64, 0u64));
        let err = ledger.deposit_to_account(&wallet("alice"), Amount::ZERO).unwrap_err();
        assert_eq!(err.reason(), Reason::ZeroAmount);
    }

    #[test]
    fn test_deposit_overflow_reports_cap_exceeded() {
        let mut ledger = Ledger::new(LedgerConfig::new(Amount::MAX, Amount::MAX));
        ledger.deposit_to_account(&wallet("alice"), Amount::MAX).unwrap();
        let err = ledger.deposit_to_account(&wallet("bob"), amt(1)).unwrap_err();
        assert_eq!(err.reason(), Reason::CapExceeded);
        assert_eq!(ledger.get_balance(&wallet("bob")), Amount::ZERO);
    }

    #[test]
    fn test_deposit_event_order() {
        let mut ledger = setup_ledger();
        let alice = wallet("alice");
        ledger.deposit_to_account(&alice, amt(10)).unwrap();
        ledger.deposit_to_account(&alice, amt(5)).unwrap();

        assert_eq!(
            ledger.events(),
            &[
                LedgerEvent::SuccessfulBalanceUpdate(SuccessfulBalanceUpdate {
                    wallet: alice.clone(),
                    new_balance: amt(10),
                }),
                LedgerEvent::SuccessfulDeposit(SuccessfulDeposit {
                    wallet: alice.clone(),
                    quantity: amt(10),
                }),
                LedgerEvent::SuccessfulBalanceUpdate(SuccessfulBalanceUpdate {
                    wallet: alice.clone(),
                    new_balance: amt(15),
                }),
                LedgerEvent::SuccessfulDeposit(SuccessfulDeposit {
                    wallet: alice,
                    quantity: amt(5),
                }),
            ]
        );
    }

    // ─── Extract tests ───

    #[test]
    fn test_extract_success() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(200)).unwrap();
        ledger.drain_events();
        ledger.extract_from_account(&alice, amt(80), &mut treasury).unwrap();

        assert_eq!(ledger.get_balance(&alice), amt(120));
        assert_eq!(ledger.total_deposited(), amt(200));
        assert_eq!(ledger.successful_extracts(), 1);
        assert_eq!(treasury.paid_to(&alice), amt(80));
        assert_eq!(
            ledger.events(),
            &[
                LedgerEvent::SuccessfulBalanceUpdate(SuccessfulBalanceUpdate {
                    wallet: alice.clone(),
                    new_balance: amt(120),
                }),
                LedgerEvent::SuccessfulExtract(SuccessfulExtract {
                    wallet: alice,
                    quantity: amt(80),
                }),
            ]
        );
    }

    #[test]
    fn test_extract_insufficient_balance() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(50)).unwrap();
        let err = ledger
            .extract_from_account(&alice, amt(80), &mut treasury)
            .unwrap_err();

        assert_eq!(err.reason(), Reason::InsufficientBalance);
        assert_eq!(ledger.get_balance(&alice), amt(50));
        assert_eq!(treasury.total_paid(), Amount::ZERO);
    }

    #[test]
    fn test_extract_exceeds_max() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(200)).unwrap();
        let err = ledger
            .extract_from_account(&alice, amt(150), &mut treasury)
            .unwrap_err();

        assert_eq!(err.reason(), Reason::ExceedsMaxWithdraw);
        assert_eq!(ledger.get_balance(&alice), amt(200));
    }

    #[test]
    fn test_max_checked_before_balance() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let err = ledger
            .extract_from_account(&wallet("nobody"), amt(150), &mut treasury)
            .unwrap_err();
        assert_eq!(err.reason(), Reason::ExceedsMaxWithdraw);
    }

    #[test]
    fn test_extract_exactly_max() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(100)).unwrap();
        ledger.extract_from_account(&alice, amt(100), &mut treasury).unwrap();
        assert_eq!(ledger.get_balance(&alice), Amount::ZERO);
        // Entry persists at zero
        assert_eq!(ledger.wallet_count(), 1);
    }

    #[test]
    fn test_extract_zero_quantity_succeeds() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let alice = wallet("alice");

        ledger.extract_from_account(&alice, Amount::ZERO, &mut treasury).unwrap();
        assert_eq!(ledger.get_balance(&alice), Amount::ZERO);
        assert_eq!(ledger.successful_extracts(), 1);
    }

    #[test]
    fn test_transfer_failure_rolls_back() {
        let mut ledger = setup_ledger();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(90)).unwrap();
        let events_before = ledger.events().len();

        let err = ledger
            .extract_from_account(&alice, amt(40), &mut FailingTransfer)
            .unwrap_err();

        assert_eq!(err.reason(), Reason::TransferFailed);
        assert_eq!(ledger.get_balance(&alice), amt(90));
        assert_eq!(ledger.successful_extracts(), 0);
        assert_eq!(ledger.events().len(), events_before);
    }

    #[test]
    fn test_failed_first_touch_leaves_no_entry() {
        let mut ledger = setup_ledger();
        let alice = wallet("alice");

        ledger
            .extract_from_account(&alice, Amount::ZERO, &mut FailingTransfer)
            .unwrap_err();
        assert_eq!(ledger.wallet_count(), 0);
    }

    // ─── Direct receipt ───

    #[test]
    fn test_receive_always_rejected() {
        let mut ledger = setup_ledger();
        let alice = wallet("alice");

        let err = ledger.receive(&alice, amt(10)).unwrap_err();
        assert_eq!(err.reason(), Reason::DirectTransferNotAllowed);
        assert!(matches!(err, LedgerError::FailedDeposit { .. }));
        assert_eq!(ledger.total_deposited(), Amount::ZERO);
        assert_eq!(ledger.get_balance(&alice), Amount::ZERO);
    }

    // ─── Queries / invariants ───

    #[test]
    fn test_get_balance_untouched() {
        let ledger = setup_ledger();
        assert_eq!(ledger.get_balance(&wallet("ghost")), Amount::ZERO);
    }

    #[test]
    fn test_invariants_hold_after_round_trip() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();
        let alice = wallet("alice");

        ledger.deposit_to_account(&alice, amt(70)).unwrap();
        ledger.extract_from_account(&alice, amt(70), &mut treasury).unwrap();

        assert_eq!(ledger.get_balance(&alice), Amount::ZERO);
        assert_eq!(ledger.total_deposited(), amt(70));
        assert_eq!(ledger.check_invariants(), Ok(()));
    }

    #[test]
    fn test_multiple_wallets_isolated() {
        let mut ledger = setup_ledger();
        let mut treasury = Treasury::new();

        ledger.deposit_to_account(&wallet("alice"), amt(10)).unwrap();
        ledger.deposit_to_account(&wallet("bob"), amt(5)).unwrap();
        let err = ledger
            .extract_from_account(&wallet("bob"), amt(10), &mut treasury)
            .unwrap_err();

        assert_eq!(err.reason(), Reason::InsufficientBalance);
        assert_eq!(ledger.get_balance(&wallet("alice")), amt(10));
        assert_eq!(ledger.get_balance(&wallet("bob")), amt(5));
        assert_eq!(ledger.total_balances(), amt(15));
    }

    #[test]
    fn test_drain_events() {
        let mut ledger = setup_ledger();
        ledger.deposit_to_account(&wallet("alice"), amt(1)).unwrap();

        let events = ledger.drain_events();
        assert_eq!(events.len(), 2);
        assert!(ledger.events().is_empty());
    }
}
