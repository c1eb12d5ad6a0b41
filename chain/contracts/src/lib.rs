//! Contract Logic for the Collateral Vault and Binary-Outcome Markets
//!
//! This crate implements the ledger components that move value between users
//! and a pooled vault: a collateral vault minting vault units against a base
//! asset, a deposit cap ledger, a withdrawal rate limiter, a price-gated
//! reward distributor, and binary-outcome markets minting long/short claims.
//! Every public operation runs as one atomic unit of work through
//! [`protocol::Protocol`].
//!
//! # Modules
//! - `events`: Contract events (actor, recipient, gross, net, fee)
//! - `audit`: Hash-chained audit trail of committed events
//! - `errors`: Contract-specific error types
//! - `security`: Admin access control, allowlists, pause switches
//! - `token`: Fungible token ledgers with allowances and minter authority
//! - `config`: Serde-loadable protocol configuration
//! - `deposit_record`: Global and per-user deposit caps
//! - `withdrawal`: Rolling-window withdrawal rate limits
//! - `token_sender`: Fee-to-reward conversion at an oracle price
//! - `hooks`: Pluggable deposit/withdraw/mint/redeem policy hooks
//! - `env`: Host environment shared by components and hooks
//! - `vault`: Collateral vault
//! - `market`: Binary-outcome market and settlement
//! - `protocol`: Atomic host over all of the above

pub mod errors;
pub mod events;
pub mod audit;
pub mod security;
pub mod token;
pub mod config;
pub mod deposit_record;
pub mod withdrawal;
pub mod token_sender;
pub mod hooks;
pub mod env;
pub mod vault;
pub mod market;
pub mod protocol;

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
