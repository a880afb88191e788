//! Run export
//!
//! Serializes the result of a finished run to JSON for external consumption.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vault_ledger::snapshot::LedgerSnapshot;

use crate::engine::SimEngine;
use crate::metrics::SimMetrics;

/// Combined export containing all simulation outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub metrics: SimMetrics,
    pub final_state: LedgerSnapshot,
    pub state_hash: String,
    pub payouts: BTreeMap<WalletId, Amount>,
    pub invariant_violations: usize,
    pub outcome_count: usize,
}

/// Build a complete simulation export.
pub fn build_export(engine: &SimEngine, metrics: &SimMetrics) -> SimulationExport {
    let final_state = engine.ledger().snapshot();
    SimulationExport {
        version: crate::VERSION.to_string(),
        metrics: metrics.clone(),
        state_hash: final_state.state_hash(),
        final_state,
        payouts: engine.treasury().payouts().clone(),
        invariant_violations: engine.invariant_violations().len(),
        outcome_count: engine.outcomes.len(),
    }
}

/// Export complete simulation data as JSON.
pub fn export_json(export: &SimulationExport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

/// Write export to a file path.
pub fn write_to_file(export: &SimulationExport, path: &str) -> std::io::Result<()> {
    let json = export_json(export)?;
    std::fs::write(path, json)
}
