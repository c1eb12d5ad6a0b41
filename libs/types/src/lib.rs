//! Types library for the collateral vault and market contracts
//!
//! This library provides the core type definitions shared by the contract
//! layer: identifiers, fee rates and the fixed-point helpers used to move
//! value between assets of different precision without losing or fabricating
//! units.
//!
//! # Modules
//! - `ids`: Unique identifiers (AccountId, TokenId, MarketId)
//! - `numeric`: Integer fixed-point math (mul_div, decimal scaling, display)
//! - `fee`: Fee rates in parts-per-million and fee calculation
//! - `errors`: Numeric error taxonomy

pub mod ids;
pub mod numeric;
pub mod fee;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::fee::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
