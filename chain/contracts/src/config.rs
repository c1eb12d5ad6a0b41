//! Protocol configuration
//!
//! Plain structs with defaults, loadable from JSON and validated before a
//! [`crate::protocol::Protocol`] is built from them.

use serde::{Deserialize, Serialize};
use types::fee::{FeeRate, PERCENT_DENOMINATOR};
use types::numeric::MAX_TOKEN_DECIMALS;

use crate::errors::ConfigError;
use crate::token_sender::MULTIPLIER_DENOMINATOR;

/// Symbol and precision of a token the protocol registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenSpec {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Collateral vault configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub base_token: TokenSpec,
    pub vault_token: TokenSpec,
    pub deposit_fee_rate: FeeRate,
    pub withdraw_fee_rate: FeeRate,
    /// Immutable ceiling for both fee rates.
    pub fee_limit: FeeRate,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            base_token: TokenSpec::new("USDC", 6),
            vault_token: TokenSpec::new("preUSDC", 18),
            deposit_fee_rate: FeeRate::ZERO,
            withdraw_fee_rate: FeeRate::ZERO,
            fee_limit: FeeRate::DEFAULT_LIMIT,
        }
    }
}

/// Deposit cap ledger configuration (amounts in base-asset units).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositCapConfig {
    pub global_cap: u128,
    pub user_cap: u128,
}

impl Default for DepositCapConfig {
    fn default() -> Self {
        Self {
            global_cap: u128::MAX,
            user_cap: u128::MAX,
        }
    }
}

/// Withdrawal rate limiter configuration (amounts in base-asset units,
/// periods in seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawLimitConfig {
    pub period_length: i64,
    pub global_limit: u128,
    /// Absolute floor under the effective limit.
    pub raw_floor: u128,
    /// Floor as parts-per-million of global net deposits.
    pub percent_floor_ppm: u32,
    pub user_period_length: i64,
    /// Optional per-user limit; `None` disables the per-user window.
    pub user_limit: Option<u128>,
}

impl Default for WithdrawLimitConfig {
    fn default() -> Self {
        Self {
            period_length: 86_400,
            global_limit: u128::MAX,
            raw_floor: 0,
            percent_floor_ppm: 0,
            user_period_length: 86_400,
            user_limit: None,
        }
    }
}

/// Reward distributor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub output_token: TokenSpec,
    /// Scaled by [`MULTIPLIER_DENOMINATOR`]; 10_000 = 1x.
    pub price_multiplier: u128,
    pub scaled_price_lower_bound: u128,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            output_token: TokenSpec::new("PPO", 18),
            price_multiplier: MULTIPLIER_DENOMINATOR,
            scaled_price_lower_bound: 0,
        }
    }
}

/// Complete protocol configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub vault: VaultConfig,
    pub deposit_caps: DepositCapConfig,
    pub withdraw_limits: WithdrawLimitConfig,
    pub reward: RewardConfig,
}

impl ProtocolConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let vault = &self.vault;
        if u128::from(vault.fee_limit.ppm()) > PERCENT_DENOMINATOR {
            return Err(invalid("vault.fee_limit", "must not exceed 100%"));
        }
        if vault.deposit_fee_rate > vault.fee_limit {
            return Err(invalid("vault.deposit_fee_rate", "exceeds fee limit"));
        }
        if vault.withdraw_fee_rate > vault.fee_limit {
            return Err(invalid("vault.withdraw_fee_rate", "exceeds fee limit"));
        }
        for (field, spec) in [
            ("vault.base_token", &vault.base_token),
            ("vault.vault_token", &vault.vault_token),
            ("reward.output_token", &self.reward.output_token),
        ] {
            if spec.symbol.is_empty() {
                return Err(invalid(field, "symbol must not be empty"));
            }
            if spec.decimals > MAX_TOKEN_DECIMALS {
                return Err(invalid(field, format!("decimals above {MAX_TOKEN_DECIMALS}")));
            }
        }
        if vault.base_token.symbol == vault.vault_token.symbol {
            return Err(invalid("vault.vault_token", "must differ from base token"));
        }

        let limits = &self.withdraw_limits;
        if limits.period_length <= 0 {
            return Err(invalid("withdraw_limits.period_length", "must be positive"));
        }
        if limits.user_period_length <= 0 {
            return Err(invalid("withdraw_limits.user_period_length", "must be positive"));
        }
        if u128::from(limits.percent_floor_ppm) > PERCENT_DENOMINATOR {
            return Err(invalid("withdraw_limits.percent_floor_ppm", "must not exceed 100%"));
        }

        if self.reward.price_multiplier == 0 {
            return Err(invalid("reward.price_multiplier", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
