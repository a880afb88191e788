//! Step-by-step scenario execution
//!
//! Each step is one ledger invocation. The engine records its outcome and
//! the events it emitted, then checks the balance invariants before the
//! next step runs.

use ledger_types::ids::{InvocationId, WalletId};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use vault_ledger::abi::{Message, Receipt};
use vault_ledger::config::LedgerConfig;
use vault_ledger::errors::{InvariantViolation, Reason};
use vault_ledger::events::LedgerEvent;
use vault_ledger::ledger::Ledger;
use vault_ledger::transfer::Treasury;

use crate::scenario::{Scenario, Step};

/// Result of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    Committed { receipt: Receipt },
    Rejected { reason: Reason, message: String },
}

impl StepResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, StepResult::Committed { .. })
    }
}

/// Everything observable about one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub sequence: u64,
    pub invocation_id: InvocationId,
    pub caller: WalletId,
    pub message: Message,
    pub result: StepResult,
    pub events: Vec<LedgerEvent>,
}

/// Deterministic simulation engine.
///
/// Owns a ledger and the treasury that receives its payouts. Outcomes are
/// appended in execution order.
pub struct SimEngine {
    ledger: Ledger,
    treasury: Treasury,
    pub outcomes: Vec<StepOutcome>,
    pub sequence: u64,
    invariant_violations: Vec<(u64, InvariantViolation)>,
}

impl SimEngine {
    pub fn new(config: LedgerConfig, rejecting: impl IntoIterator<Item = WalletId>) -> Self {
        Self {
            ledger: Ledger::new(config),
            treasury: Treasury::with_rejecting(rejecting),
            outcomes: Vec::new(),
            sequence: 0,
            invariant_violations: Vec::new(),
        }
    }

    /// Engine set up with a scenario's config and rejecting wallets.
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self::new(scenario.config, scenario.rejecting_wallets.iter().cloned())
    }

    /// Execute one step and return its outcome.
    pub fn run_step(&mut self, step: &Step) -> &StepOutcome {
        self.sequence += 1;
        let invocation_id = InvocationId::new();

        let result = match self.ledger.invoke_with_id(
            invocation_id,
            &step.caller,
            step.message,
            &mut self.treasury,
        ) {
            Ok(receipt) => StepResult::Committed { receipt },
            Err(err) => StepResult::Rejected {
                reason: err.reason(),
                message: err.to_string(),
            },
        };

        if let Err(violation) = self.ledger.check_invariants() {
            error!(sequence = self.sequence, %violation, "Ledger invariant violated");
            self.invariant_violations.push((self.sequence, violation));
        }

        self.outcomes.push(StepOutcome {
            sequence: self.sequence,
            invocation_id,
            caller: step.caller.clone(),
            message: step.message,
            result,
            events: self.ledger.drain_events(),
        });

        &self.outcomes[self.outcomes.len() - 1]
    }

    /// Execute all steps in order.
    pub fn run(&mut self, steps: &[Step]) {
        info!(steps = steps.len(), "Starting simulation run");
        for step in steps {
            self.run_step(step);
        }
        info!(
            committed = self.outcomes.iter().filter(|o| o.result.is_committed()).count(),
            total_deposited = %self.ledger.total_deposited(),
            total_paid = %self.treasury.total_paid(),
            "Simulation run finished"
        );
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Steps after which an invariant did not hold, with the violation.
    pub fn invariant_violations(&self) -> &[(u64, InvariantViolation)] {
        &self.invariant_violations
    }
}
