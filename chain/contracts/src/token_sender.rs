//! Token Sender — converts fee amounts into reward tokens at an oracle price
//!
//! `scaled_price = price * multiplier / MULTIPLIER_DENOMINATOR`, and the reward
//! is `amount * 10^output_decimals / scaled_price`. Rewards are best effort:
//! a price at or below the lower bound, a reward that rounds to zero or a
//! reward the sender cannot cover all pay nothing without failing the caller.
//! Oracle failures do propagate.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use types::errors::NumericError;
use types::ids::{AccountId, TokenId};
use types::numeric::{mul_div, pow10};

use crate::errors::{OracleError, TokenSenderError};
use crate::events::RewardSent;
use crate::security::{AccessControl, Allowlist};
use crate::token::TokenRegistry;

/// Denominator of the price multiplier (10_000 = 1x).
pub const MULTIPLIER_DENOMINATOR: u128 = 10_000;

/// Source of the reward token's price, in base-asset units per whole reward
/// token.
pub trait PriceOracle: fmt::Debug + Send + Sync {
    fn read(&self) -> Result<u128, OracleError>;
}

/// Fixed price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPrice(pub u128);

impl PriceOracle for StaticPrice {
    fn read(&self) -> Result<u128, OracleError> {
        Ok(self.0)
    }
}

/// Reward distributor holding a balance of the output token.
#[derive(Debug, Clone)]
pub struct TokenSender {
    account: AccountId,
    output_token: TokenId,
    oracle: Arc<dyn PriceOracle>,
    price_multiplier: u128,
    scaled_price_lower_bound: u128,
    allowed_callers: Allowlist,
    access_control: AccessControl,
}

impl TokenSender {
    pub fn new(
        admin: AccountId,
        output_token: TokenId,
        oracle: Arc<dyn PriceOracle>,
        price_multiplier: u128,
        scaled_price_lower_bound: u128,
    ) -> Result<Self, TokenSenderError> {
        if price_multiplier == 0 {
            return Err(TokenSenderError::InvalidMultiplier);
        }
        Ok(Self {
            account: AccountId::new(),
            output_token,
            oracle,
            price_multiplier,
            scaled_price_lower_bound,
            allowed_callers: Allowlist::new(),
            access_control: AccessControl::new(admin),
        })
    }

    /// Account holding the reward inventory.
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn output_token(&self) -> &TokenId {
        &self.output_token
    }

    pub fn price_multiplier(&self) -> u128 {
        self.price_multiplier
    }

    pub fn scaled_price_lower_bound(&self) -> u128 {
        self.scaled_price_lower_bound
    }

    pub fn is_allowed_caller(&self, caller: &AccountId) -> bool {
        self.allowed_callers.contains(caller)
    }

    /// Current oracle price after applying the multiplier.
    pub fn scaled_price(&self) -> Result<u128, TokenSenderError> {
        let price = self.oracle.read()?;
        Ok(mul_div(price, self.price_multiplier, MULTIPLIER_DENOMINATOR)?)
    }

    /// Reward owed for `unconverted_amount` at `scaled_price`, before
    /// checking the sender's inventory. Zero when the price is at or below
    /// the lower bound; `None` when the reward does not fit in a `u128`.
    pub fn quote(
        &self,
        tokens: &TokenRegistry,
        unconverted_amount: u128,
        scaled_price: u128,
    ) -> Result<Option<u128>, TokenSenderError> {
        if scaled_price <= self.scaled_price_lower_bound || scaled_price == 0 {
            return Ok(Some(0));
        }
        let unit = pow10(u32::from(tokens.decimals(&self.output_token)?))?;
        match mul_div(unconverted_amount, unit, scaled_price) {
            Ok(reward) => Ok(Some(reward)),
            Err(NumericError::Overflow) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Pay `recipient` the reward for `unconverted_amount`.
    ///
    /// Returns the payment record; `reward == 0` means nothing was sent.
    pub fn send(
        &self,
        tokens: &mut TokenRegistry,
        caller: &AccountId,
        recipient: AccountId,
        unconverted_amount: u128,
    ) -> Result<RewardSent, TokenSenderError> {
        if !self.allowed_callers.contains(caller) {
            return Err(TokenSenderError::CallerNotAllowed);
        }

        let scaled_price = self.scaled_price()?;
        let inventory = tokens.balance_of(&self.output_token, &self.account)?;
        let reward = match self.quote(tokens, unconverted_amount, scaled_price)? {
            Some(0) => {
                debug!(%recipient, unconverted_amount, scaled_price, "reward rounds to zero, skipping");
                0
            }
            Some(owed) if owed <= inventory => {
                tokens.transfer(&self.output_token, &self.account, recipient, owed)?;
                debug!(%recipient, reward = owed, scaled_price, "reward sent");
                owed
            }
            // An unrepresentable reward exceeds any inventory
            owed => {
                warn!(
                    %recipient,
                    reward = ?owed,
                    inventory,
                    token = %self.output_token,
                    "reward inventory short, skipping"
                );
                0
            }
        };

        Ok(RewardSent {
            recipient,
            unconverted_amount,
            scaled_price,
            reward,
        })
    }

    // ───────────────────────── Admin ─────────────────────────

    pub fn set_price_multiplier(&mut self, admin: &AccountId, multiplier: u128) -> Result<(), TokenSenderError> {
        self.ensure_admin(admin)?;
        if multiplier == 0 {
            return Err(TokenSenderError::InvalidMultiplier);
        }
        self.price_multiplier = multiplier;
        Ok(())
    }

    pub fn set_scaled_price_lower_bound(&mut self, admin: &AccountId, bound: u128) -> Result<(), TokenSenderError> {
        self.ensure_admin(admin)?;
        self.scaled_price_lower_bound = bound;
        Ok(())
    }

    pub fn set_oracle(&mut self, admin: &AccountId, oracle: Arc<dyn PriceOracle>) -> Result<(), TokenSenderError> {
        self.ensure_admin(admin)?;
        self.oracle = oracle;
        Ok(())
    }

    pub fn set_allowed_caller(
        &mut self,
        admin: &AccountId,
        caller: AccountId,
        allowed: bool,
    ) -> Result<(), TokenSenderError> {
        self.ensure_admin(admin)?;
        self.allowed_callers.set(caller, allowed);
        Ok(())
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), TokenSenderError> {
        if !self.access_control.is_admin(caller) {
            return Err(TokenSenderError::Unauthorized);
        }
        Ok(())
    }
}
