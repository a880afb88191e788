//! Custodial Vault Ledger
//!
//! Single-asset ledger that accepts deposits up to a global bank cap,
//! tracks a balance per wallet, and pays bounded withdrawals back to the
//! wallet that owns them.
//!
//! # Modules
//! - `config`: Immutable construction parameters (max extract, bank cap)
//! - `errors`: Rejection reasons and failure signals
//! - `events`: Events emitted by committed operations
//! - `ledger`: The balance state machine with journaled rollback
//! - `transfer`: Outbound value movement seam and in-memory treasury
//! - `abi`: Message dispatch for the invoking environment
//! - `snapshot`: Deterministic state images with integrity hash
//! - `shared`: Mutex-serialized access from many threads

pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod transfer;
pub mod abi;
pub mod snapshot;
pub mod shared;

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
