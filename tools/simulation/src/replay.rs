//! Deterministic replay validation
//!
//! Same calls in the same order must produce the same ledger state. An
//! outcome log can be turned back into a scenario and replayed into a
//! fresh engine; the two state hashes must match.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vault_ledger::snapshot::LedgerSnapshot;

use crate::engine::{SimEngine, StepOutcome};
use crate::scenario::{Scenario, Step};

/// Run a scenario into a fresh engine and return the final snapshot.
pub fn replay_and_snapshot(scenario: &Scenario) -> LedgerSnapshot {
    let mut engine = SimEngine::for_scenario(scenario);
    engine.run(&scenario.steps);
    engine.ledger().snapshot()
}

/// Rebuild the call sequence from an outcome log.
///
/// Rejected calls are kept: they must be rejected again on replay.
pub fn steps_from_outcomes(outcomes: &[StepOutcome]) -> Vec<Step> {
    outcomes
        .iter()
        .map(|o| Step::new(o.caller.clone(), o.message))
        .collect()
}

/// Result of replay validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayValidation {
    pub matches: bool,
    pub original_hash: String,
    pub replayed_hash: String,
}

/// Replay `scenario` and compare against an expected final state.
pub fn validate_replay(scenario: &Scenario, expected: &LedgerSnapshot) -> ReplayValidation {
    let replayed = replay_and_snapshot(scenario);
    let validation = ReplayValidation {
        matches: replayed == *expected,
        original_hash: expected.state_hash(),
        replayed_hash: replayed.state_hash(),
    };

    if validation.matches {
        info!(hash = %validation.replayed_hash, "Replay matches original state");
    } else {
        warn!(
            original = %validation.original_hash,
            replayed = %validation.replayed_hash,
            "Replay diverged from original state"
        );
    }
    validation
}

/// Export an outcome log as JSON.
pub fn export_outcome_log(outcomes: &[StepOutcome]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcomes)
}

/// Import an outcome log from JSON.
pub fn import_outcome_log(json: &str) -> Result<Vec<StepOutcome>, serde_json::Error> {
    serde_json::from_str(json)
}
