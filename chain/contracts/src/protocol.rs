//! Protocol — the host that owns every component and runs each public
//! operation as one atomic unit of work
//!
//! An operation runs against a staged copy of the ledgers, vault and
//! markets. The copy replaces the live state only when the operation returns
//! `Ok`; any error, including one raised deep inside a hook after other
//! ledgers were already touched, discards it. The audit trail is never
//! copied: events buffer in the staged `Env` and are appended on commit.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::fee::FeeRate;
use types::ids::{AccountId, MarketId, TokenId};

use crate::audit::AuditTrail;
use crate::config::{ProtocolConfig, RewardConfig};
use crate::deposit_record::DepositRecord;
use crate::env::Env;
use crate::errors::ProtocolError;
use crate::hooks::{DepositHook, Hook, HookSlot, RedeemHook, WithdrawHook};
use crate::market::{Market, MarketParams};
use crate::security::AccessControl;
use crate::token::{TokenLedger, TokenRegistry};
use crate::token_sender::{PriceOracle, TokenSender};
use crate::vault::CollateralVault;
use crate::withdrawal::WithdrawLimiter;

#[derive(Debug)]
pub struct Protocol {
    env: Env,
    vault: CollateralVault,
    markets: BTreeMap<MarketId, Market>,
    reward: RewardConfig,
    access_control: AccessControl,
    audit: AuditTrail,
}

impl Protocol {
    /// Build the protocol from a validated config.
    ///
    /// Registers the base asset and the reward token with `admin` as their
    /// issuer, and the vault unit with the vault as its minter.
    pub fn new(admin: AccountId, config: ProtocolConfig) -> Result<Self, ProtocolError> {
        config.validate()?;

        let mut tokens = TokenRegistry::new();
        let base = &config.vault.base_token;
        tokens.register(TokenLedger::new(
            TokenId::new(base.symbol.as_str()),
            base.decimals,
            admin,
        )?)?;
        let reward = &config.reward.output_token;
        if reward.symbol != base.symbol {
            tokens.register(TokenLedger::new(
                TokenId::new(reward.symbol.as_str()),
                reward.decimals,
                admin,
            )?)?;
        }

        let vault = CollateralVault::new(admin, &config.vault, &mut tokens)?;
        let env = Env::new(
            tokens,
            DepositRecord::new(admin, &config.deposit_caps),
            WithdrawLimiter::new(admin, config.withdraw_limits.clone()),
        );

        info!(%admin, vault = %vault.account(), "protocol initialised");
        Ok(Self {
            env,
            vault,
            markets: BTreeMap::new(),
            reward: config.reward,
            access_control: AccessControl::new(admin),
            audit: AuditTrail::new(),
        })
    }

    /// Run `f` against a staged copy and commit it only on success.
    pub fn atomically<T, F>(&mut self, operation: &'static str, f: F) -> Result<T, ProtocolError>
    where
        F: FnOnce(&mut Self) -> Result<T, ProtocolError>,
    {
        let mut staged = self.stage();
        match f(&mut staged) {
            Ok(value) => {
                let pending = staged.env.take_pending();
                staged.audit = std::mem::take(&mut self.audit);
                let committed = staged.audit.commit(pending);
                *self = staged;
                debug!(operation, events = committed, "operation committed");
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, "operation rolled back");
                Err(err)
            }
        }
    }

    /// Copy of everything an operation may mutate. The copy's audit trail is
    /// empty; the live trail moves over only on commit.
    fn stage(&self) -> Self {
        Self {
            env: self.env.clone(),
            vault: self.vault.clone(),
            markets: self.markets.clone(),
            reward: self.reward.clone(),
            access_control: self.access_control.clone(),
            audit: AuditTrail::new(),
        }
    }

    /// Advance the clock. Not part of any unit of work.
    pub fn set_time(&mut self, now: i64) {
        self.env.set_time(now);
    }

    // ───────────────────────── Token plumbing ─────────────────────────

    /// Let `spender` pull up to `amount` of `token` from `owner`.
    pub fn approve(&mut self, token: &TokenId, owner: AccountId, spender: AccountId, amount: u128) -> Result<(), ProtocolError> {
        self.atomically("approve", |p| Ok(p.env.tokens.approve(token, owner, spender, amount)?))
    }

    pub fn transfer(&mut self, token: &TokenId, from: AccountId, to: AccountId, amount: u128) -> Result<(), ProtocolError> {
        self.atomically("transfer", |p| Ok(p.env.tokens.transfer(token, &from, to, amount)?))
    }

    /// Issue `amount` of an admin-issued token (base asset or reward token).
    pub fn issue(&mut self, admin: &AccountId, token: &TokenId, to: AccountId, amount: u128) -> Result<(), ProtocolError> {
        self.atomically("issue", |p| Ok(p.env.tokens.mint(token, admin, to, amount)?))
    }

    // ───────────────────────── Vault ─────────────────────────

    pub fn deposit(&mut self, caller: AccountId, recipient: AccountId, amount: u128) -> Result<u128, ProtocolError> {
        self.atomically("deposit", |p| {
            Ok(p.vault.deposit(&mut p.env, caller, recipient, amount)?)
        })
    }

    pub fn withdraw(&mut self, caller: AccountId, recipient: AccountId, vault_amount: u128) -> Result<u128, ProtocolError> {
        self.atomically("withdraw", |p| {
            Ok(p.vault.withdraw(&mut p.env, caller, recipient, vault_amount)?)
        })
    }

    pub fn set_deposit_fee(&mut self, admin: &AccountId, rate: FeeRate) -> Result<(), ProtocolError> {
        self.atomically("set_deposit_fee", |p| {
            Ok(p.vault.set_deposit_fee(&mut p.env, admin, rate)?)
        })
    }

    pub fn set_withdraw_fee(&mut self, admin: &AccountId, rate: FeeRate) -> Result<(), ProtocolError> {
        self.atomically("set_withdraw_fee", |p| {
            Ok(p.vault.set_withdraw_fee(&mut p.env, admin, rate)?)
        })
    }

    pub fn set_deposit_hook(&mut self, admin: &AccountId, hook: HookSlot) -> Result<(), ProtocolError> {
        self.atomically("set_deposit_hook", |p| {
            Ok(p.vault.set_deposit_hook(&mut p.env, admin, hook)?)
        })
    }

    pub fn set_withdraw_hook(&mut self, admin: &AccountId, hook: HookSlot) -> Result<(), ProtocolError> {
        self.atomically("set_withdraw_hook", |p| {
            Ok(p.vault.set_withdraw_hook(&mut p.env, admin, hook)?)
        })
    }

    pub fn set_deposits_paused(&mut self, admin: &AccountId, paused: bool) -> Result<(), ProtocolError> {
        self.atomically("set_deposits_paused", |p| Ok(p.vault.set_deposits_paused(admin, paused)?))
    }

    pub fn set_withdrawals_paused(&mut self, admin: &AccountId, paused: bool) -> Result<(), ProtocolError> {
        self.atomically("set_withdrawals_paused", |p| {
            Ok(p.vault.set_withdrawals_paused(admin, paused)?)
        })
    }

    /// Install the standard deposit and withdraw hooks routing fees to
    /// `treasury`, and allowlist them on every ledger they write to.
    pub fn install_vault_hooks(&mut self, admin: &AccountId, treasury: AccountId) -> Result<(AccountId, AccountId), ProtocolError> {
        self.atomically("install_vault_hooks", |p| {
            p.ensure_admin(admin)?;
            let deposit_hook = DepositHook::new(treasury);
            let withdraw_hook = WithdrawHook::new(treasury);
            let (deposit_account, withdraw_account) = (deposit_hook.account(), withdraw_hook.account());

            p.env
                .deposit_record
                .set_allowed_caller(admin, deposit_account, true)?;
            p.env
                .deposit_record
                .set_allowed_caller(admin, withdraw_account, true)?;
            p.env
                .withdraw_limiter
                .set_allowed_caller(admin, withdraw_account, true)?;
            if let Some(sender) = p.env.token_sender.as_mut() {
                sender.set_allowed_caller(admin, deposit_account, true)?;
                sender.set_allowed_caller(admin, withdraw_account, true)?;
            }

            p.vault
                .set_deposit_hook(&mut p.env, admin, HookSlot::enabled(deposit_hook))?;
            p.vault
                .set_withdraw_hook(&mut p.env, admin, HookSlot::enabled(withdraw_hook))?;
            Ok((deposit_account, withdraw_account))
        })
    }

    // ───────────────────────── Reward distributor ─────────────────────────

    /// Install the reward distributor using the configured reward token and
    /// `oracle`. Existing fee-routing hooks are allowlisted on it. Returns
    /// the account holding the reward inventory.
    pub fn install_token_sender(&mut self, admin: &AccountId, oracle: Arc<dyn PriceOracle>) -> Result<AccountId, ProtocolError> {
        self.atomically("install_token_sender", |p| {
            p.ensure_admin(admin)?;
            let mut sender = TokenSender::new(
                *admin,
                TokenId::new(p.reward.output_token.symbol.as_str()),
                oracle,
                p.reward.price_multiplier,
                p.reward.scaled_price_lower_bound,
            )?;
            for hook in p.fee_routing_hooks() {
                sender.set_allowed_caller(admin, hook, true)?;
            }
            let account = sender.account();
            info!(%account, token = %sender.output_token(), "token sender installed");
            p.env.token_sender = Some(sender);
            Ok(account)
        })
    }

    /// Run an admin action against the installed reward distributor.
    pub fn configure_token_sender<F>(&mut self, f: F) -> Result<(), ProtocolError>
    where
        F: FnOnce(&mut TokenSender) -> Result<(), crate::errors::TokenSenderError>,
    {
        self.atomically("configure_token_sender", |p| {
            let sender = p
                .env
                .token_sender
                .as_mut()
                .ok_or(ProtocolError::TokenSenderMissing)?;
            Ok(f(sender)?)
        })
    }

    // ───────────────────────── Deposit caps & withdraw limits ─────────────────────────

    pub fn set_global_cap(&mut self, admin: &AccountId, cap: u128) -> Result<(), ProtocolError> {
        self.atomically("set_global_cap", |p| Ok(p.env.deposit_record.set_global_cap(admin, cap)?))
    }

    pub fn set_user_cap(&mut self, admin: &AccountId, cap: u128) -> Result<(), ProtocolError> {
        self.atomically("set_user_cap", |p| Ok(p.env.deposit_record.set_user_cap(admin, cap)?))
    }

    pub fn set_cap_bypass(&mut self, admin: &AccountId, user: AccountId, bypassed: bool) -> Result<(), ProtocolError> {
        self.atomically("set_cap_bypass", |p| {
            Ok(p.env.deposit_record.set_bypass(admin, user, bypassed)?)
        })
    }

    /// Change the global withdraw limit; rejected below the floor implied by
    /// current net deposits.
    pub fn set_global_withdraw_limit(&mut self, admin: &AccountId, limit: u128) -> Result<(), ProtocolError> {
        self.atomically("set_global_withdraw_limit", |p| {
            let global_net = p.env.deposit_record.global_net_deposited();
            Ok(p.env.withdraw_limiter.set_global_limit(admin, limit, global_net)?)
        })
    }

    pub fn set_withdraw_period(&mut self, admin: &AccountId, period_length: i64) -> Result<(), ProtocolError> {
        self.atomically("set_withdraw_period", |p| {
            Ok(p.env.withdraw_limiter.set_period_length(admin, period_length)?)
        })
    }

    pub fn set_withdraw_floors(&mut self, admin: &AccountId, raw_floor: u128, percent_floor_ppm: u32) -> Result<(), ProtocolError> {
        self.atomically("set_withdraw_floors", |p| {
            Ok(p.env
                .withdraw_limiter
                .set_floors(admin, raw_floor, percent_floor_ppm)?)
        })
    }

    pub fn set_user_withdraw_limit(
        &mut self,
        admin: &AccountId,
        user_limit: Option<u128>,
        user_period_length: i64,
    ) -> Result<(), ProtocolError> {
        self.atomically("set_user_withdraw_limit", |p| {
            Ok(p.env
                .withdraw_limiter
                .set_user_limit(admin, user_limit, user_period_length)?)
        })
    }

    // ───────────────────────── Markets ─────────────────────────

    pub fn create_market(&mut self, admin: &AccountId, params: MarketParams) -> Result<MarketId, ProtocolError> {
        self.atomically("create_market", |p| {
            p.ensure_admin(admin)?;
            if p.markets.contains_key(&params.id) {
                return Err(ProtocolError::MarketExists {
                    market: params.id.to_string(),
                });
            }
            let id = params.id.clone();
            let market = Market::create(&mut p.env, *admin, params, p.vault.fee_limit())?;
            p.markets.insert(id.clone(), market);
            Ok(id)
        })
    }

    pub fn mint(&mut self, market: &MarketId, caller: AccountId, amount: u128) -> Result<u128, ProtocolError> {
        self.atomically("mint", |p| {
            let m = p.markets.get(market).ok_or_else(|| unknown(market))?;
            Ok(m.mint(&mut p.env, caller, amount)?)
        })
    }

    pub fn redeem(
        &mut self,
        market: &MarketId,
        caller: AccountId,
        long_amount: u128,
        short_amount: u128,
        recipient: AccountId,
    ) -> Result<u128, ProtocolError> {
        self.atomically("redeem", |p| {
            let m = p.markets.get(market).ok_or_else(|| unknown(market))?;
            Ok(m.redeem(&mut p.env, caller, long_amount, short_amount, recipient)?)
        })
    }

    pub fn set_final_payout(&mut self, admin: &AccountId, market: &MarketId, payout: u128) -> Result<(), ProtocolError> {
        self.atomically("set_final_payout", |p| {
            let m = p.markets.get_mut(market).ok_or_else(|| unknown(market))?;
            Ok(m.set_final_payout(&mut p.env, admin, payout)?)
        })
    }

    pub fn set_redemption_fee(&mut self, admin: &AccountId, market: &MarketId, rate: FeeRate) -> Result<(), ProtocolError> {
        self.atomically("set_redemption_fee", |p| {
            let m = p.markets.get_mut(market).ok_or_else(|| unknown(market))?;
            Ok(m.set_redemption_fee(&mut p.env, admin, rate)?)
        })
    }

    pub fn set_mint_hook(&mut self, admin: &AccountId, market: &MarketId, hook: HookSlot) -> Result<(), ProtocolError> {
        self.atomically("set_mint_hook", |p| {
            let m = p.markets.get_mut(market).ok_or_else(|| unknown(market))?;
            Ok(m.set_mint_hook(&mut p.env, admin, hook)?)
        })
    }

    pub fn set_redeem_hook(&mut self, admin: &AccountId, market: &MarketId, hook: HookSlot) -> Result<(), ProtocolError> {
        self.atomically("set_redeem_hook", |p| {
            let m = p.markets.get_mut(market).ok_or_else(|| unknown(market))?;
            Ok(m.set_redeem_hook(&mut p.env, admin, hook)?)
        })
    }

    /// Install a [`RedeemHook`] routing redemption fees to `treasury`.
    pub fn install_redeem_hook(&mut self, admin: &AccountId, market: &MarketId, treasury: AccountId) -> Result<AccountId, ProtocolError> {
        self.atomically("install_redeem_hook", |p| {
            let hook = RedeemHook::new(treasury);
            let account = hook.account();
            if let Some(sender) = p.env.token_sender.as_mut() {
                sender.set_allowed_caller(admin, account, true)?;
            }
            let m = p.markets.get_mut(market).ok_or_else(|| unknown(market))?;
            m.set_redeem_hook(&mut p.env, admin, HookSlot::enabled(hook))?;
            Ok(account)
        })
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.env.tokens
    }

    pub fn balance_of(&self, token: &TokenId, account: &AccountId) -> Result<u128, ProtocolError> {
        Ok(self.env.tokens.balance_of(token, account)?)
    }

    pub fn deposit_record(&self) -> &DepositRecord {
        &self.env.deposit_record
    }

    pub fn withdraw_limiter(&self) -> &WithdrawLimiter {
        &self.env.withdraw_limiter
    }

    pub fn token_sender(&self) -> Option<&TokenSender> {
        self.env.token_sender.as_ref()
    }

    pub fn vault(&self) -> &CollateralVault {
        &self.vault
    }

    pub fn market(&self, id: &MarketId) -> Option<&Market> {
        self.markets.get(id)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn now(&self) -> i64 {
        self.env.now()
    }

    pub fn admin(&self) -> &AccountId {
        self.access_control.admin()
    }

    /// Accounts of every installed hook that may ask for rewards.
    fn fee_routing_hooks(&self) -> Vec<AccountId> {
        let vault_hooks = [self.vault.deposit_hook(), self.vault.withdraw_hook()];
        vault_hooks
            .into_iter()
            .chain(self.markets.values().map(Market::redeem_hook))
            .filter_map(HookSlot::account)
            .collect()
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), ProtocolError> {
        if !self.access_control.is_admin(caller) {
            return Err(ProtocolError::Unauthorized);
        }
        Ok(())
    }
}

fn unknown(market: &MarketId) -> ProtocolError {
    ProtocolError::UnknownMarket {
        market: market.to_string(),
    }
}
