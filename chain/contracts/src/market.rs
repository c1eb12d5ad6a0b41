//! Binary-Outcome Market — long/short claim pairs against collateral
//!
//! State machine: `Open -> Finalized { payout }` (terminal).
//!
//! - `mint(N)` while open and before expiry: N collateral in, N long and
//!   N short out
//! - `redeem(long, short)`: matched pairs 1:1 while open; after settlement
//!   long pays `payout / MAX_PAYOUT` and short the complement
//! - The redemption fee only applies when a redeem hook is set
//!
//! Each market's account is the custodian of its collateral and the sole
//! minter of its claim tokens.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::errors::NumericError;
use types::fee::{FeeRate, FeeSplit, FeeType};
use types::ids::{AccountId, MarketId, TokenId};
use types::numeric::{mul_div, ratio_to_decimal};

use crate::env::Env;
use crate::errors::MarketError;
use crate::events::{ContractEvent, FinalPayoutSet, MarketCreated, Mint, Redemption};
use crate::hooks::{HookCall, HookSlot};
use crate::security::AccessControl;
use crate::token::TokenLedger;
use crate::vault::{emit_fee_change, emit_hook_change};

/// Payout scale: `MAX_PAYOUT` means long takes everything.
pub const MAX_PAYOUT: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Open,
    Finalized { payout: u128 },
}

/// Parameters a market is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    pub id: MarketId,
    pub collateral: TokenId,
    pub floor_payout: u128,
    pub ceiling_payout: u128,
    /// Valuation of the underlying when long pays the floor.
    pub floor_valuation: Decimal,
    /// Valuation of the underlying when long pays the ceiling.
    pub ceiling_valuation: Decimal,
    pub expiry_time: i64,
    pub redemption_fee_rate: FeeRate,
}

#[derive(Debug, Clone)]
pub struct Market {
    params: MarketParams,
    account: AccountId,
    long_token: TokenId,
    short_token: TokenId,
    settlement: Settlement,
    fee_limit: FeeRate,
    mint_hook: HookSlot,
    redeem_hook: HookSlot,
    access_control: AccessControl,
}

impl Market {
    /// Validate `params`, register the claim tokens and emit `MarketCreated`.
    ///
    /// Claim tokens share the collateral's decimals.
    pub fn create(env: &mut Env, admin: AccountId, params: MarketParams, fee_limit: FeeRate) -> Result<Self, MarketError> {
        if params.floor_payout >= params.ceiling_payout || params.ceiling_payout > MAX_PAYOUT {
            return Err(MarketError::InvalidPayoutRange {
                floor: params.floor_payout,
                ceiling: params.ceiling_payout,
            });
        }
        if params.floor_valuation.is_sign_negative() || params.floor_valuation > params.ceiling_valuation {
            return Err(MarketError::InvalidValuationRange);
        }
        if params.expiry_time <= env.now() {
            return Err(MarketError::ExpiryInPast {
                expiry: params.expiry_time,
                now: env.now(),
            });
        }
        if params.redemption_fee_rate > fee_limit {
            return Err(MarketError::FeeExceedsLimit {
                rate: params.redemption_fee_rate.ppm(),
                limit: fee_limit.ppm(),
            });
        }

        let decimals = env.tokens.decimals(&params.collateral)?;
        let account = AccountId::new();
        let long_token = params.id.long_token();
        let short_token = params.id.short_token();
        env.tokens
            .register(TokenLedger::new(long_token.clone(), decimals, account)?)?;
        env.tokens
            .register(TokenLedger::new(short_token.clone(), decimals, account)?)?;

        info!(
            market = %params.id,
            collateral = %params.collateral,
            floor = params.floor_payout,
            ceiling = params.ceiling_payout,
            expiry = params.expiry_time,
            "market created"
        );
        env.emit(ContractEvent::MarketCreated(MarketCreated {
            market: params.id.clone(),
            collateral: params.collateral.clone(),
            floor_payout: params.floor_payout,
            ceiling_payout: params.ceiling_payout,
            expiry_time: params.expiry_time,
        }));

        Ok(Self {
            params,
            account,
            long_token,
            short_token,
            settlement: Settlement::Open,
            fee_limit,
            mint_hook: HookSlot::Disabled,
            redeem_hook: HookSlot::Disabled,
            access_control: AccessControl::new(admin),
        })
    }

    // ───────────────────────── Mint ─────────────────────────

    /// Lock `amount` collateral from `caller` and mint `amount` long and
    /// `amount` short to them.
    pub fn mint(&self, env: &mut Env, caller: AccountId, amount: u128) -> Result<u128, MarketError> {
        if matches!(self.settlement, Settlement::Finalized { .. }) {
            return Err(MarketError::MarketFinalized);
        }
        if env.now() >= self.params.expiry_time {
            return Err(MarketError::MarketEnded);
        }
        if amount == 0 {
            return Err(MarketError::InvalidAmount);
        }

        env.tokens
            .transfer_from(&self.params.collateral, &self.account, &caller, self.account, amount)?;

        self.mint_hook.invoke(
            env,
            &HookCall {
                token: self.params.collateral.clone(),
                custodian: self.account,
                funder: caller,
                recipient: caller,
                amount_before_fee: amount,
                amount_after_fee: amount,
            },
        )?;

        env.tokens.mint(&self.long_token, &self.account, caller, amount)?;
        env.tokens.mint(&self.short_token, &self.account, caller, amount)?;

        info!(market = %self.params.id, minter = %caller, amount, "claim pair minted");
        env.emit(ContractEvent::Mint(Mint {
            market: self.params.id.clone(),
            minter: caller,
            amount,
        }));
        Ok(amount)
    }

    // ───────────────────────── Redeem ─────────────────────────

    /// Collateral owed for burning `long_amount` long and `short_amount`
    /// short under the current settlement, before fees.
    pub fn owed_for(&self, long_amount: u128, short_amount: u128) -> Result<u128, MarketError> {
        match self.settlement {
            Settlement::Open => {
                if long_amount != short_amount {
                    return Err(MarketError::UnmatchedRedemption {
                        long: long_amount,
                        short: short_amount,
                    });
                }
                Ok(long_amount)
            }
            Settlement::Finalized { payout } => {
                let long_share = mul_div(long_amount, payout, MAX_PAYOUT)?;
                let short_share = mul_div(short_amount, MAX_PAYOUT - payout, MAX_PAYOUT)?;
                Ok(long_share
                    .checked_add(short_share)
                    .ok_or(NumericError::Overflow)?)
            }
        }
    }

    /// Burn claims held by `caller` and pay the collateral owed, net of the
    /// redemption fee, to `recipient`.
    pub fn redeem(
        &self,
        env: &mut Env,
        caller: AccountId,
        long_amount: u128,
        short_amount: u128,
        recipient: AccountId,
    ) -> Result<u128, MarketError> {
        let long_held = env.tokens.balance_of(&self.long_token, &caller)?;
        if long_amount > long_held {
            return Err(MarketError::InsufficientLong {
                requested: long_amount,
                available: long_held,
            });
        }
        let short_held = env.tokens.balance_of(&self.short_token, &caller)?;
        if short_amount > short_held {
            return Err(MarketError::InsufficientShort {
                requested: short_amount,
                available: short_held,
            });
        }

        let owed = self.owed_for(long_amount, short_amount)?;
        if owed == 0 {
            return Err(MarketError::InvalidAmount);
        }
        let split = if self.redeem_hook.is_enabled() {
            let split = FeeSplit::compute(owed, self.params.redemption_fee_rate)?;
            if split.is_dust(self.params.redemption_fee_rate) {
                return Err(MarketError::ZeroFee);
            }
            split
        } else {
            FeeSplit::compute(owed, FeeRate::ZERO)?
        };

        env.tokens
            .burn(&self.long_token, &self.account, &caller, long_amount)?;
        env.tokens
            .burn(&self.short_token, &self.account, &caller, short_amount)?;

        self.redeem_hook.invoke(
            env,
            &HookCall {
                token: self.params.collateral.clone(),
                custodian: self.account,
                funder: caller,
                recipient,
                amount_before_fee: split.amount_before_fee,
                amount_after_fee: split.amount_after_fee,
            },
        )?;

        env.tokens.transfer(
            &self.params.collateral,
            &self.account,
            recipient,
            split.amount_after_fee,
        )?;

        info!(
            market = %self.params.id,
            redeemer = %caller,
            %recipient,
            long_amount,
            short_amount,
            fee = split.fee,
            paid = split.amount_after_fee,
            "claims redeemed"
        );
        env.emit(ContractEvent::Redemption(Redemption {
            market: self.params.id.clone(),
            redeemer: caller,
            recipient,
            long_amount,
            short_amount,
            amount_before_fee: split.amount_before_fee,
            fee: split.fee,
            amount_after_fee: split.amount_after_fee,
        }));
        Ok(split.amount_after_fee)
    }

    // ───────────────────────── Settlement ─────────────────────────

    /// Settle the market. Write-once; `floor <= payout <= ceiling`.
    pub fn set_final_payout(&mut self, env: &mut Env, admin: &AccountId, payout: u128) -> Result<(), MarketError> {
        self.ensure_admin(admin)?;
        if matches!(self.settlement, Settlement::Finalized { .. }) {
            return Err(MarketError::PayoutAlreadySet);
        }
        if payout < self.params.floor_payout || payout > self.params.ceiling_payout {
            return Err(MarketError::PayoutOutOfBounds {
                payout,
                floor: self.params.floor_payout,
                ceiling: self.params.ceiling_payout,
            });
        }
        self.settlement = Settlement::Finalized { payout };

        info!(market = %self.params.id, payout, "market finalized");
        env.emit(ContractEvent::FinalPayoutSet(FinalPayoutSet {
            market: self.params.id.clone(),
            payout,
        }));
        Ok(())
    }

    /// Valuation implied by a long price in `[0, 1]`:
    /// `floor + long_price * (ceiling - floor)`.
    pub fn valuation_at(&self, long_price: Decimal) -> Result<Decimal, MarketError> {
        if long_price.is_sign_negative() || long_price > Decimal::ONE {
            return Err(MarketError::InvalidLongPrice);
        }
        let span = self.params.ceiling_valuation - self.params.floor_valuation;
        long_price
            .checked_mul(span)
            .and_then(|v| v.checked_add(self.params.floor_valuation))
            .ok_or(MarketError::Numeric(NumericError::Overflow))
    }

    /// Valuation at the settled payout, `None` while open.
    pub fn settled_valuation(&self) -> Result<Option<Decimal>, MarketError> {
        match self.settlement {
            Settlement::Open => Ok(None),
            Settlement::Finalized { payout } => {
                let long_price = ratio_to_decimal(payout, MAX_PAYOUT)?;
                Ok(Some(self.valuation_at(long_price)?))
            }
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn id(&self) -> &MarketId {
        &self.params.id
    }

    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn collateral(&self) -> &TokenId {
        &self.params.collateral
    }

    pub fn long_token(&self) -> &TokenId {
        &self.long_token
    }

    pub fn short_token(&self) -> &TokenId {
        &self.short_token
    }

    pub fn settlement(&self) -> Settlement {
        self.settlement
    }

    pub fn redemption_fee_rate(&self) -> FeeRate {
        self.params.redemption_fee_rate
    }

    pub fn redeem_hook(&self) -> &HookSlot {
        &self.redeem_hook
    }

    pub fn mint_hook(&self) -> &HookSlot {
        &self.mint_hook
    }

    // ───────────────────────── Admin ─────────────────────────

    pub fn set_redemption_fee(&mut self, env: &mut Env, admin: &AccountId, rate: FeeRate) -> Result<(), MarketError> {
        self.ensure_admin(admin)?;
        if rate > self.fee_limit {
            return Err(MarketError::FeeExceedsLimit {
                rate: rate.ppm(),
                limit: self.fee_limit.ppm(),
            });
        }
        self.params.redemption_fee_rate = rate;
        emit_fee_change(env, FeeType::RedemptionFee, rate);
        Ok(())
    }

    pub fn set_mint_hook(&mut self, env: &mut Env, admin: &AccountId, hook: HookSlot) -> Result<(), MarketError> {
        self.ensure_admin(admin)?;
        emit_hook_change(env, "market.mint", &hook);
        self.mint_hook = hook;
        Ok(())
    }

    pub fn set_redeem_hook(&mut self, env: &mut Env, admin: &AccountId, hook: HookSlot) -> Result<(), MarketError> {
        self.ensure_admin(admin)?;
        emit_hook_change(env, "market.redeem", &hook);
        self.redeem_hook = hook;
        Ok(())
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), MarketError> {
        if !self.access_control.is_admin(caller) {
            return Err(MarketError::Unauthorized);
        }
        Ok(())
    }
}
