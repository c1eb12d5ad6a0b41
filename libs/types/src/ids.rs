//! Unique identifier types for ledger entities
//!
//! Accounts use UUID v7 so that identities created during a session sort by
//! creation time. Tokens and markets are identified by human-readable symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an account (user, treasury, hook or contract custody).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
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

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fungible token identifier (e.g. "USDC", "preUSDC", "ACME-LONG").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Create a new TokenId from a symbol
    ///
    /// # Panics
    /// Panics if the symbol is empty
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(!s.is_empty(), "TokenId must not be empty");
        Self(s)
    }

    /// Try to create a TokenId, returning None if the symbol is empty
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Binary-outcome market identifier (e.g. "ACME-IPO-2027")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Create a new MarketId from a name
    ///
    /// # Panics
    /// Panics if the name is empty or contains whitespace
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        assert!(
            Self::is_valid(&s),
            "MarketId must be non-empty and contain no whitespace"
        );
        Self(s)
    }

    /// Try to create a MarketId, returning None if invalid
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if Self::is_valid(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    fn is_valid(s: &str) -> bool {
        !s.is_empty() && !s.chars().any(char::is_whitespace)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Symbol of the long claim token minted by this market
    pub fn long_token(&self) -> TokenId {
        TokenId::new(format!("{}-LONG", self.0))
    }

    /// Symbol of the short claim token minted by this market
    pub fn short_token(&self) -> TokenId {
        TokenId::new(format!("{}-SHORT", self.0))
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
