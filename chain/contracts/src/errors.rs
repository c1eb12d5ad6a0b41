//! Contract-specific error types
//!
//! Every rejection carries a message naming the invariant it protects. A
//! rejected unit of work never leaves partial state behind; see
//! [`crate::protocol::Protocol`].

use thiserror::Error;
use types::errors::NumericError;

/// Token ledger errors (balances, allowances, mint authority)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Unknown token: {token}")]
    UnknownToken { token: String },

    #[error("Token already registered: {token}")]
    AlreadyRegistered { token: String },

    #[error("Insufficient balance for {token}: required {required}, available {available}")]
    InsufficientBalance {
        token: String,
        required: u128,
        available: u128,
    },

    #[error("Insufficient allowance for {token}: required {required}, available {available}")]
    InsufficientAllowance {
        token: String,
        required: u128,
        available: u128,
    },

    #[error("Caller is not the minter of {token}")]
    NotMinter { token: String },

    #[error("Unsupported token decimals: {decimals}")]
    InvalidDecimals { decimals: u8 },

    #[error("Arithmetic overflow in token supply")]
    Overflow,
}

/// Deposit cap ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositRecordError {
    #[error("msg.sender not allowed")]
    CallerNotAllowed,

    #[error("global cap exceeded: {attempted} > {cap}")]
    GlobalCapExceeded { attempted: u128, cap: u128 },

    #[error("user cap exceeded: {attempted} > {cap}")]
    UserCapExceeded { attempted: u128, cap: u128 },

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Arithmetic overflow in deposit totals")]
    Overflow,
}

/// Withdrawal rate limiter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WithdrawLimitError {
    #[error("msg.sender not allowed")]
    CallerNotAllowed,

    #[error("global withdraw limit exceeded: {attempted} > {limit}")]
    GlobalLimitExceeded { attempted: u128, limit: u128 },

    #[error("user withdraw limit exceeded: {attempted} > {limit}")]
    UserLimitExceeded { attempted: u128, limit: u128 },

    #[error("limit below minimum: {limit} < {minimum}")]
    LimitBelowMinimum { limit: u128, minimum: u128 },

    #[error("Invalid period length: {period_length}")]
    InvalidPeriod { period_length: i64 },

    #[error("Invalid percent floor: {ppm}ppm")]
    InvalidPercentFloor { ppm: u32 },

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
}

/// Price feed errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Price feed unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Reward distributor errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenSenderError {
    #[error("msg.sender not allowed")]
    CallerNotAllowed,

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Invalid price multiplier: must be positive")]
    InvalidMultiplier,

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
}

/// Errors raised from inside a policy hook. Any of these aborts the
/// enclosing deposit, withdrawal, mint or redemption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Deposit record: {0}")]
    DepositRecord(#[from] DepositRecordError),

    #[error("Withdraw limit: {0}")]
    WithdrawLimit(#[from] WithdrawLimitError),

    #[error("Token sender: {0}")]
    TokenSender(#[from] TokenSenderError),

    #[error("Token: {0}")]
    Token(#[from] TokenError),

    #[error("account not allowed: {account}")]
    AccountNotAllowed { account: String },

    #[error("Hook rejected: {reason}")]
    Rejected { reason: String },
}

/// Collateral vault errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("deposits not allowed")]
    DepositsPaused,

    #[error("withdrawals not allowed")]
    WithdrawalsPaused,

    #[error("amount = 0")]
    InvalidAmount,

    #[error("fee = 0")]
    ZeroFee,

    #[error("amount {amount} converts to 0")]
    ZeroConversion { amount: u128 },

    #[error("fee rate {rate}ppm exceeds limit {limit}ppm")]
    FeeExceedsLimit { rate: u32, limit: u32 },

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
}

/// Binary-outcome market errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("market ended")]
    MarketEnded,

    #[error("market finalized")]
    MarketFinalized,

    #[error("payout already set")]
    PayoutAlreadySet,

    #[error("payout {payout} out of bounds [{floor}, {ceiling}]")]
    PayoutOutOfBounds { payout: u128, floor: u128, ceiling: u128 },

    #[error("invalid payout range: floor {floor}, ceiling {ceiling}")]
    InvalidPayoutRange { floor: u128, ceiling: u128 },

    #[error("invalid valuation range")]
    InvalidValuationRange,

    #[error("expiry {expiry} not after {now}")]
    ExpiryInPast { expiry: i64, now: i64 },

    #[error("amount = 0")]
    InvalidAmount,

    #[error("fee = 0")]
    ZeroFee,

    #[error("long != short")]
    UnmatchedRedemption { long: u128, short: u128 },

    #[error("insufficient long tokens: requested {requested}, available {available}")]
    InsufficientLong { requested: u128, available: u128 },

    #[error("insufficient short tokens: requested {requested}, available {available}")]
    InsufficientShort { requested: u128, available: u128 },

    #[error("long price out of range [0, 1]")]
    InvalidLongPrice,

    #[error("fee rate {rate}ppm exceeds limit {limit}ppm")]
    FeeExceedsLimit { rate: u32, limit: u32 },

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Invalid config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Audit trail errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Audit chain broken at sequence {sequence}")]
    BrokenChain { sequence: u64 },
}

/// Top-level error returned by [`crate::protocol::Protocol`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Deposit record error: {0}")]
    DepositRecord(#[from] DepositRecordError),

    #[error("Withdraw limit error: {0}")]
    WithdrawLimit(#[from] WithdrawLimitError),

    #[error("Token sender error: {0}")]
    TokenSender(#[from] TokenSenderError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown market: {market}")]
    UnknownMarket { market: String },

    #[error("Market already exists: {market}")]
    MarketExists { market: String },

    #[error("No token sender installed")]
    TokenSenderMissing,

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,
}
