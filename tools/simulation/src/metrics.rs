//! Simulation counters
//!
//! Tracks accepted and rejected calls per operation, rejection reasons,
//! and value volumes.

use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use vault_ledger::abi::Message;

use crate::engine::{StepOutcome, StepResult};

/// Aggregated simulation metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub total_steps: u64,
    pub deposits_accepted: u64,
    pub deposits_rejected: u64,
    pub extracts_accepted: u64,
    pub extracts_rejected: u64,
    pub balance_queries: u64,
    pub direct_transfers_rejected: u64,
    /// Rejections keyed by reason code
    pub rejections_by_reason: BTreeMap<String, u64>,
    pub volume_deposited: Amount,
    pub volume_extracted: Amount,
    pub elapsed_ns: u64,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single outcome into metrics.
    pub fn record_outcome(&mut self, outcome: &StepOutcome) {
        self.total_steps += 1;
        let committed = outcome.result.is_committed();

        match outcome.message {
            Message::DepositToAccount { value } => {
                if committed {
                    self.deposits_accepted += 1;
                    self.volume_deposited = self.volume_deposited.checked_add(value).unwrap_or(Amount::MAX);
                } else {
                    self.deposits_rejected += 1;
                }
            }
            Message::ExtractFromAccount { quantity } => {
                if committed {
                    self.extracts_accepted += 1;
                    self.volume_extracted = self.volume_extracted.checked_add(quantity).unwrap_or(Amount::MAX);
                } else {
                    self.extracts_rejected += 1;
                }
            }
            Message::GetBalance => self.balance_queries += 1,
            Message::Receive { .. } => self.direct_transfers_rejected += 1,
        }

        if let StepResult::Rejected { reason, .. } = &outcome.result {
            *self
                .rejections_by_reason
                .entry(reason.code().to_string())
                .or_insert(0) += 1;
        }
    }

    /// Build metrics from a full outcome log.
    pub fn from_outcomes(outcomes: &[StepOutcome]) -> Self {
        let mut metrics = Self::new();
        for outcome in outcomes {
            metrics.record_outcome(outcome);
        }
        metrics
    }

    /// Record wall time of the run, saturating at `u64::MAX` nanoseconds.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejections_by_reason.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimEngine;
    use crate::scenario::Step;
    use ledger_types::ids::WalletId;
    use vault_ledger::config::LedgerConfig;

    #[test]
    fn test_metrics_from_run() {
        let alice = WalletId::from("alice");
        let mut engine = SimEngine::new(LedgerConfig::new(100u64, 1000u64), []);
        engine.run(&[
            Step::new(alice.clone(), Message::DepositToAccount { value: Amount::new(600) }),
            Step::new(alice.clone(), Message::DepositToAccount { value: Amount::new(500) }),
            Step::new(alice.clone(), Message::DepositToAccount { value: Amount::ZERO }),
            Step::new(alice.clone(), Message::ExtractFromAccount { quantity: Amount::new(150) }),
            Step::new(alice.clone(), Message::ExtractFromAccount { quantity: Amount::new(100) }),
            Step::new(alice.clone(), Message::GetBalance),
            Step::new(alice, Message::Receive { value: Amount::new(3) }),
        ]);

        let metrics = SimMetrics::from_outcomes(&engine.outcomes);
        assert_eq!(metrics.total_steps, 7);
        assert_eq!(metrics.deposits_accepted, 1);
        assert_eq!(metrics.deposits_rejected, 2);
        assert_eq!(metrics.extracts_accepted, 1);
        assert_eq!(metrics.extracts_rejected, 1);
        assert_eq!(metrics.balance_queries, 1);
        assert_eq!(metrics.direct_transfers_rejected, 1);
        assert_eq!(metrics.volume_deposited, Amount::new(600));
        assert_eq!(metrics.volume_extracted, Amount::new(100));
        assert_eq!(metrics.rejections_by_reason["CapExceeded"], 1);
        assert_eq!(metrics.rejections_by_reason["ZeroAmount"], 1);
        assert_eq!(metrics.rejections_by_reason["ExceedsMaxWithdraw"], 1);
        assert_eq!(metrics.rejections_by_reason["DirectTransferNotAllowed"], 1);
        assert_eq!(metrics.total_rejected(), 4);
    }

    #[test]
    fn test_set_elapsed_saturates() {
        let mut metrics = SimMetrics::new();
        metrics.set_elapsed(Duration::from_micros(3));
        assert_eq!(metrics.elapsed_ns, 3_000);
        metrics.set_elapsed(Duration::MAX);
        assert_eq!(metrics.elapsed_ns, u64::MAX);
    }

    #[test]
    fn test_metrics_serialization() {
        let metrics = SimMetrics::new();
        let json = serde_json::to_string(&metrics).unwrap();
        let back: SimMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(metrics, back);
    }
}
