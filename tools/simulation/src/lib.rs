//! Ledger Simulation & Replay Framework
//!
//! Drives the vault ledger through scripted or randomly generated call
//! sequences, checks the balance invariants after every step, and verifies
//! that replaying the same calls reproduces the same state.
//!
//! # Modules
//! - `scenario` — Scenario files (config, rejecting wallets, call steps)
//! - `generator` — Seeded random scenario generator
//! - `engine` — Step-by-step execution against a ledger and treasury
//! - `metrics` — Accepted/rejected counters and volumes
//! - `replay` — Deterministic replay validation
//! - `export` — JSON export of a finished run

pub mod scenario;
pub mod generator;
pub mod engine;
pub mod metrics;
pub mod replay;
pub mod export;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
