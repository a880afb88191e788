//! Identifier types for ledger principals and invocations
//!
//! Wallets are opaque principals (typically an address string). Invocation
//! ids use UUID v7 so log lines of one call sort chronologically.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identity of a caller owning exactly one ledger balance.
///
/// The ledger never interprets the contents; any non-empty string
/// (e.g. `"0x5b38da6a..."`) is a valid principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct WalletId(String);

/// Rejected attempt to build a `WalletId` from an empty string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("WalletId must not be empty")]
pub struct EmptyWalletId;

impl WalletId {
    /// Create a new WalletId
    ///
    /// # Panics
    /// Panics if `address` is empty
    pub fn new(address: impl Into<String>) -> Self {
        let s = address.into();
        assert!(!s.is_empty(), "WalletId must not be empty");
        Self(s)
    }

    /// Try to create a WalletId, returning None if empty
    pub fn try_new(address: impl Into<String>) -> Option<Self> {
        let s = address.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WalletId {
    type Error = EmptyWalletId;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        Self::try_new(address).ok_or(EmptyWalletId)
    }
}

impl From<&str> for WalletId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Correlation id for a single ledger invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
