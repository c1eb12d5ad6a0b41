//! Error types for fixed-point arithmetic
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Errors raised by the integer math helpers in [`crate::numeric`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unsupported decimals: {decimals}")]
    DecimalsOutOfRange { decimals: u8 },
}
