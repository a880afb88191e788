//! External call surface
//!
//! `Message` is what the invoking environment selects: one of the three
//! named operations, or bare value with no operation. Only
//! `depositToAccount` and bare `receive` carry value; the non-payable
//! operations have no field to attach it to.

use ledger_types::ids::{InvocationId, WalletId};
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use tracing::{info_span, trace};

use crate::errors::LedgerError;
use crate::ledger::Ledger;
use crate::transfer::ValueTransfer;

/// An operation selected by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Message {
    /// Payable: credit the attached value
    DepositToAccount { value: Amount },
    /// Pay `quantity` out of the caller's balance
    ExtractFromAccount { quantity: Amount },
    /// Read the caller's balance
    GetBalance,
    /// Value arrived with no operation selected
    Receive { value: Amount },
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::DepositToAccount { .. } => "depositToAccount",
            Message::ExtractFromAccount { .. } => "extractFromAccount",
            Message::GetBalance => "getBalance",
            Message::Receive { .. } => "receive",
        }
    }

    /// Value attached to the call.
    pub fn attached_value(&self) -> Amount {
        match self {
            Message::DepositToAccount { value } | Message::Receive { value } => *value,
            Message::ExtractFromAccount { .. } | Message::GetBalance => Amount::ZERO,
        }
    }
}

/// Return data of a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receipt {
    Unit,
    Balance(Amount),
}

impl Ledger {
    /// Dispatch one call from `caller`.
    pub fn invoke<T>(
        &mut self,
        caller: &WalletId,
        message: Message,
        transfer: &mut T,
    ) -> Result<Receipt, LedgerError>
    where
        T: ValueTransfer + ?Sized,
    {
        self.invoke_with_id(InvocationId::new(), caller, message, transfer)
    }

    /// Dispatch one call under a caller-supplied correlation id.
    pub fn invoke_with_id<T>(
        &mut self,
        invocation_id: InvocationId,
        caller: &WalletId,
        message: Message,
        transfer: &mut T,
    ) -> Result<Receipt, LedgerError>
    where
        T: ValueTransfer + ?Sized,
    {
        let span = info_span!("invoke", %invocation_id, op = message.name(), wallet = %caller);
        let _entered = span.enter();
        trace!(value = %message.attached_value(), "Dispatching");

        match message {
            Message::DepositToAccount { value } => {
                self.deposit_to_account(caller, value).map(|_| Receipt::Unit)
            }
            Message::ExtractFromAccount { quantity } => self
                .extract_from_account(caller, quantity, transfer)
                .map(|_| Receipt::Unit),
            Message::GetBalance => Ok(Receipt::Balance(self.get_balance(caller))),
            Message::Receive { value } => self.receive(caller, value).map(|_| Receipt::Unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::errors::Reason;
    use crate::transfer::Treasury;

    #[test]
    fn test_message_json_shape() {
        let msg: Message = serde_json::from_str(r#"{"op":"depositToAccount","value":600}"#).unwrap();
        assert_eq!(msg, Message::DepositToAccount { value: Amount::new(600) });

        let msg: Message = serde_json::from_str(r#"{"op":"getBalance"}"#).unwrap();
        assert_eq!(msg, Message::GetBalance);

        let json = serde_json::to_string(&Message::ExtractFromAccount {
            quantity: Amount::new(5),
        })
        .unwrap();
        assert_eq!(json, r#"{"op":"extractFromAccount","quantity":5}"#);
    }

    #[test]
    fn test_non_payable_ignores_value_field() {
        // Unknown fields are ignored by serde, but the value never reaches the ledger
        let msg: Message =
            serde_json::from_str(r#"{"op":"extractFromAccount","quantity":5,"value":9}"#).unwrap();
        assert_eq!(msg.attached_value(), Amount::ZERO);
    }

    #[test]
    fn test_invoke_dispatch() {
        let mut ledger = Ledger::new(LedgerConfig::new(100u64, 1000u64));
        let mut treasury = Treasury::new();
        let alice = WalletId::from("alice");

        let receipt = ledger
            .invoke(&alice, Message::DepositToAccount { value: Amount::new(60) }, &mut treasury)
            .unwrap();
        assert_eq!(receipt, Receipt::Unit);

        ledger
            .invoke(&alice, Message::ExtractFromAccount { quantity: Amount::new(25) }, &mut treasury)
            .unwrap();

        let receipt = ledger.invoke(&alice, Message::GetBalance, &mut treasury).unwrap();
        assert_eq!(receipt, Receipt::Balance(Amount::new(35)));
        assert_eq!(treasury.paid_to(&alice), Amount::new(25));
    }

    #[test]
    fn test_invoke_receive_rejected() {
        let mut ledger = Ledger::new(LedgerConfig::new(100u64, 1000u64));
        let mut treasury = Treasury::new();

        let err = ledger
            .invoke(&WalletId::from("alice"), Message::Receive { value: Amount::new(1) }, &mut treasury)
            .unwrap_err();
        assert_eq!(err.reason(), Reason::DirectTransferNotAllowed);
        assert_eq!(ledger.total_deposited(), Amount::ZERO);
    }
}
