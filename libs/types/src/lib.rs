//! Types library for the custodial vault ledger
//!
//! Value types shared by the ledger contract and the tooling around it.
//!
//! # Modules
//! - `ids`: Identifiers (WalletId, InvocationId)
//! - `numeric`: Unsigned integer quantities (Amount)

pub mod ids;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
