//! Collateral Vault — mints and burns vault units against a base asset
//!
//! - Deposit: pull base asset by allowance, charge the deposit fee, run the
//!   deposit hook, mint the decimal-adjusted net amount
//! - Withdraw: burn vault units without approval, charge the withdraw fee on
//!   the base equivalent, run the withdraw hook, pay out the net amount
//! - A positive fee rate whose fee rounds to zero is rejected ("fee = 0")
//! - Fee rates are bounded by an immutable fee limit
//! - Deposits and withdrawals pause independently
//!
//! The vault's own account is both the base-asset custodian and the sole
//! minter of the vault unit.

use rust_decimal::Decimal;
use tracing::{debug, info};
use types::fee::{FeeRate, FeeSplit, FeeType};
use types::ids::{AccountId, TokenId};
use types::numeric::{scale_amount, to_decimal};

use crate::config::VaultConfig;
use crate::env::Env;
use crate::errors::VaultError;
use crate::events::{ContractEvent, Deposit, FeeRateChanged, HookChanged, Withdraw};
use crate::hooks::{HookCall, HookSlot};
use crate::security::{AccessControl, PauseGuard};
use crate::token::{TokenLedger, TokenRegistry};

/// Deposit/withdraw amounts as they would settle right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultQuote {
    /// Fee split in base-asset units.
    pub split: FeeSplit,
    /// Vault units minted (deposit) or burned (withdraw).
    pub vault_amount: u128,
}

#[derive(Debug, Clone)]
pub struct CollateralVault {
    /// Custody account and vault-unit minter
    account: AccountId,
    base_token: TokenId,
    vault_token: TokenId,
    deposit_fee_rate: FeeRate,
    withdraw_fee_rate: FeeRate,
    fee_limit: FeeRate,
    deposit_hook: HookSlot,
    withdraw_hook: HookSlot,
    deposits: PauseGuard,
    withdrawals: PauseGuard,
    access_control: AccessControl,
}

impl CollateralVault {
    /// Create the vault and register its vault-unit token. The base token
    /// must already be registered.
    pub fn new(admin: AccountId, config: &VaultConfig, tokens: &mut TokenRegistry) -> Result<Self, VaultError> {
        for rate in [config.deposit_fee_rate, config.withdraw_fee_rate] {
            if rate > config.fee_limit {
                return Err(VaultError::FeeExceedsLimit {
                    rate: rate.ppm(),
                    limit: config.fee_limit.ppm(),
                });
            }
        }
        let base_token = TokenId::new(config.base_token.symbol.as_str());
        tokens.decimals(&base_token)?;

        let account = AccountId::new();
        let vault_token = TokenId::new(config.vault_token.symbol.as_str());
        tokens.register(TokenLedger::new(
            vault_token.clone(),
            config.vault_token.decimals,
            account,
        )?)?;

        info!(
            %account,
            base = %base_token,
            vault = %vault_token,
            fee_limit = %config.fee_limit,
            "collateral vault created"
        );
        Ok(Self {
            account,
            base_token,
            vault_token,
            deposit_fee_rate: config.deposit_fee_rate,
            withdraw_fee_rate: config.withdraw_fee_rate,
            fee_limit: config.fee_limit,
            deposit_hook: HookSlot::Disabled,
            withdraw_hook: HookSlot::Disabled,
            deposits: PauseGuard::new(),
            withdrawals: PauseGuard::new(),
            access_control: AccessControl::new(admin),
        })
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Fee split and vault units minted for a deposit of `amount`.
    pub fn preview_deposit(&self, tokens: &TokenRegistry, amount: u128) -> Result<VaultQuote, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let split = FeeSplit::compute(amount, self.deposit_fee_rate)?;
        if split.is_dust(self.deposit_fee_rate) {
            return Err(VaultError::ZeroFee);
        }
        let vault_amount = scale_amount(
            split.amount_after_fee,
            tokens.decimals(&self.base_token)?,
            tokens.decimals(&self.vault_token)?,
        )?;
        if vault_amount == 0 {
            return Err(VaultError::ZeroConversion { amount });
        }
        Ok(VaultQuote { split, vault_amount })
    }

    /// Deposit `amount` of base asset from `caller` and mint vault units to
    /// `recipient`. `caller` must have approved the vault's account.
    pub fn deposit(
        &self,
        env: &mut Env,
        caller: AccountId,
        recipient: AccountId,
        amount: u128,
    ) -> Result<u128, VaultError> {
        if self.deposits.is_paused() {
            return Err(VaultError::DepositsPaused);
        }
        let quote = self.preview_deposit(&env.tokens, amount)?;
        let split = quote.split;

        env.tokens
            .transfer_from(&self.base_token, &self.account, &caller, self.account, amount)?;

        self.deposit_hook.invoke(
            env,
            &HookCall {
                token: self.base_token.clone(),
                custodian: self.account,
                funder: caller,
                recipient,
                amount_before_fee: split.amount_before_fee,
                amount_after_fee: split.amount_after_fee,
            },
        )?;

        env.tokens
            .mint(&self.vault_token, &self.account, recipient, quote.vault_amount)?;

        info!(
            funder = %caller,
            %recipient,
            amount,
            fee = split.fee,
            minted = quote.vault_amount,
            "vault deposit"
        );
        env.emit(ContractEvent::Deposit(Deposit {
            funder: caller,
            recipient,
            amount_before_fee: split.amount_before_fee,
            fee: split.fee,
            amount_after_fee: split.amount_after_fee,
            minted: quote.vault_amount,
        }));
        Ok(quote.vault_amount)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Fee split of the base equivalent of `vault_amount`.
    pub fn preview_withdraw(&self, tokens: &TokenRegistry, vault_amount: u128) -> Result<VaultQuote, VaultError> {
        if vault_amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let base_amount = scale_amount(
            vault_amount,
            tokens.decimals(&self.vault_token)?,
            tokens.decimals(&self.base_token)?,
        )?;
        if base_amount == 0 {
            return Err(VaultError::ZeroConversion { amount: vault_amount });
        }
        let split = FeeSplit::compute(base_amount, self.withdraw_fee_rate)?;
        if split.is_dust(self.withdraw_fee_rate) {
            return Err(VaultError::ZeroFee);
        }
        Ok(VaultQuote { split, vault_amount })
    }

    /// Burn `vault_amount` from `caller` and pay the net base amount to
    /// `recipient`.
    pub fn withdraw(
        &self,
        env: &mut Env,
        caller: AccountId,
        recipient: AccountId,
        vault_amount: u128,
    ) -> Result<u128, VaultError> {
        if self.withdrawals.is_paused() {
            return Err(VaultError::WithdrawalsPaused);
        }
        let split = self.preview_withdraw(&env.tokens, vault_amount)?.split;

        env.tokens
            .burn(&self.vault_token, &self.account, &caller, vault_amount)?;

        self.withdraw_hook.invoke(
            env,
            &HookCall {
                token: self.base_token.clone(),
                custodian: self.account,
                funder: caller,
                recipient,
                amount_before_fee: split.amount_before_fee,
                amount_after_fee: split.amount_after_fee,
            },
        )?;

        env.tokens
            .transfer(&self.base_token, &self.account, recipient, split.amount_after_fee)?;

        info!(
            funder = %caller,
            %recipient,
            burned = vault_amount,
            fee = split.fee,
            paid = split.amount_after_fee,
            "vault withdrawal"
        );
        env.emit(ContractEvent::Withdraw(Withdraw {
            funder: caller,
            recipient,
            burned: vault_amount,
            amount_before_fee: split.amount_before_fee,
            fee: split.fee,
            amount_after_fee: split.amount_after_fee,
        }));
        Ok(split.amount_after_fee)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn base_token(&self) -> &TokenId {
        &self.base_token
    }

    pub fn vault_token(&self) -> &TokenId {
        &self.vault_token
    }

    pub fn deposit_fee_rate(&self) -> FeeRate {
        self.deposit_fee_rate
    }

    pub fn withdraw_fee_rate(&self) -> FeeRate {
        self.withdraw_fee_rate
    }

    pub fn fee_limit(&self) -> FeeRate {
        self.fee_limit
    }

    pub fn deposit_hook(&self) -> &HookSlot {
        &self.deposit_hook
    }

    pub fn withdraw_hook(&self) -> &HookSlot {
        &self.withdraw_hook
    }

    pub fn deposits_paused(&self) -> bool {
        self.deposits.is_paused()
    }

    pub fn withdrawals_paused(&self) -> bool {
        self.withdrawals.is_paused()
    }

    /// Base asset held in custody, including fees no hook has collected.
    pub fn total_assets(&self, tokens: &TokenRegistry) -> Result<u128, VaultError> {
        Ok(tokens.balance_of(&self.base_token, &self.account)?)
    }

    /// [`Self::total_assets`] in whole base-asset units.
    pub fn total_assets_display(&self, tokens: &TokenRegistry) -> Result<Decimal, VaultError> {
        let decimals = tokens.decimals(&self.base_token)?;
        Ok(to_decimal(self.total_assets(tokens)?, decimals)?)
    }

    // ───────────────────────── Admin ─────────────────────────

    pub fn set_deposit_fee(&mut self, env: &mut Env, admin: &AccountId, rate: FeeRate) -> Result<(), VaultError> {
        self.ensure_admin(admin)?;
        self.check_fee_limit(rate)?;
        self.deposit_fee_rate = rate;
        emit_fee_change(env, FeeType::DepositFee, rate);
        Ok(())
    }

    pub fn set_withdraw_fee(&mut self, env: &mut Env, admin: &AccountId, rate: FeeRate) -> Result<(), VaultError> {
        self.ensure_admin(admin)?;
        self.check_fee_limit(rate)?;
        self.withdraw_fee_rate = rate;
        emit_fee_change(env, FeeType::WithdrawFee, rate);
        Ok(())
    }

    pub fn set_deposit_hook(&mut self, env: &mut Env, admin: &AccountId, hook: HookSlot) -> Result<(), VaultError> {
        self.ensure_admin(admin)?;
        emit_hook_change(env, "vault.deposit", &hook);
        self.deposit_hook = hook;
        Ok(())
    }

    pub fn set_withdraw_hook(&mut self, env: &mut Env, admin: &AccountId, hook: HookSlot) -> Result<(), VaultError> {
        self.ensure_admin(admin)?;
        emit_hook_change(env, "vault.withdraw", &hook);
        self.withdraw_hook = hook;
        Ok(())
    }

    pub fn set_deposits_paused(&mut self, admin: &AccountId, paused: bool) -> Result<(), VaultError> {
        self.ensure_admin(admin)?;
        if paused {
            self.deposits.pause();
        } else {
            self.deposits.unpause();
        }
        info!(paused, "vault deposits pause switch");
        Ok(())
    }

    pub fn set_withdrawals_paused(&mut self, admin: &AccountId, paused: bool) -> Result<(), VaultError> {
        self.ensure_admin(admin)?;
        if paused {
            self.withdrawals.pause();
        } else {
            self.withdrawals.unpause();
        }
        info!(paused, "vault withdrawals pause switch");
        Ok(())
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), VaultError> {
        if !self.access_control.is_admin(caller) {
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }

    fn check_fee_limit(&self, rate: FeeRate) -> Result<(), VaultError> {
        if rate > self.fee_limit {
            return Err(VaultError::FeeExceedsLimit {
                rate: rate.ppm(),
                limit: self.fee_limit.ppm(),
            });
        }
        Ok(())
    }
}

pub(crate) fn emit_fee_change(env: &mut Env, fee_type: FeeType, rate: FeeRate) {
    debug!(%fee_type, %rate, "fee rate changed");
    env.emit(ContractEvent::FeeRateChanged(FeeRateChanged {
        fee_type,
        rate_ppm: rate.ppm(),
    }));
}

pub(crate) fn emit_hook_change(env: &mut Env, slot: &str, hook: &HookSlot) {
    debug!(slot, enabled = hook.is_enabled(), "hook changed");
    env.emit(ContractEvent::HookChanged(HookChanged {
        slot: slot.to_string(),
        hook: hook.account(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DepositCapConfig, TokenSpec, WithdrawLimitConfig};
    use crate::deposit_record::DepositRecord;
    use crate::errors::{HookError, TokenError};
    use crate::hooks::Hook;
    use crate::withdrawal::WithdrawLimiter;

    struct Setup {
        admin: AccountId,
        alice: AccountId,
        env: Env,
        vault: CollateralVault,
    }

    fn setup_with(base_decimals: u8, vault_decimals: u8, deposit_fee: u32, withdraw_fee: u32) -> Setup {
        let admin = AccountId::new();
        let alice = AccountId::new();
        let mut tokens = TokenRegistry::new();
        tokens
            .register(TokenLedger::new(TokenId::new("USDC"), base_decimals, admin).unwrap())
            .unwrap();
        tokens
            .mint(&TokenId::new("USDC"), &admin, alice, 10u128.pow(u32::from(base_decimals) + 6))
            .unwrap();

        let config = VaultConfig {
            base_token: TokenSpec::new("USDC", base_decimals),
            vault_token: TokenSpec::new("preUSDC", vault_decimals),
            deposit_fee_rate: FeeRate::from_ppm(deposit_fee),
            withdraw_fee_rate: FeeRate::from_ppm(withdraw_fee),
            fee_limit: FeeRate::DEFAULT_LIMIT,
        };
        let vault = CollateralVault::new(admin, &config, &mut tokens).unwrap();
        tokens
            .approve(&TokenId::new("USDC"), alice, vault.account(), u128::MAX)
            .unwrap();
        let env = Env::new(
            tokens,
            DepositRecord::new(admin, &DepositCapConfig::default()),
            WithdrawLimiter::new(admin, WithdrawLimitConfig::default()),
        );
        Setup {
            admin,
            alice,
            env,
            vault,
        }
    }

    fn setup() -> Setup {
        setup_with(6, 18, 10_000, 10_000)
    }

    fn base(s: &Setup, account: &AccountId) -> u128 {
        s.env.tokens.balance_of(&TokenId::new("USDC"), account).unwrap()
    }

    fn units(s: &Setup, account: &AccountId) -> u128 {
        s.env.tokens.balance_of(&TokenId::new("preUSDC"), account).unwrap()
    }

    // ─── Deposit tests ───

    #[test]
    fn test_deposit_mints_scaled_net_amount() {
        let mut s = setup();
        let before = base(&s, &s.alice);
        let minted = s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000).unwrap();

        // 1% fee, 6 -> 18 decimals
        assert_eq!(minted, 990_000 * 10u128.pow(12));
        assert_eq!(units(&s, &s.alice), minted);
        assert_eq!(base(&s, &s.alice), before - 1_000_000);
        // No hook: the fee stays in custody
        assert_eq!(s.vault.total_assets(&s.env.tokens).unwrap(), 1_000_000);
    }

    #[test]
    fn test_deposit_to_other_recipient() {
        let mut s = setup();
        let bob = AccountId::new();
        s.vault.deposit(&mut s.env, s.alice, bob, 1_000_000).unwrap();
        assert_eq!(units(&s, &s.alice), 0);
        assert!(units(&s, &bob) > 0);
    }

    #[test]
    fn test_deposit_zero_amount() {
        let mut s = setup();
        let result = s.vault.deposit(&mut s.env, s.alice, s.alice, 0);
        assert_eq!(result, Err(VaultError::InvalidAmount));
    }

    #[test]
    fn test_deposit_dust_fee_rejected() {
        let mut s = setup();
        // 1% of 99 rounds to zero
        let result = s.vault.deposit(&mut s.env, s.alice, s.alice, 99);
        assert_eq!(result, Err(VaultError::ZeroFee));
        assert!(s.vault.deposit(&mut s.env, s.alice, s.alice, 100).is_ok());
    }

    #[test]
    fn test_deposit_zero_rate_allows_any_amount() {
        let mut s = setup_with(6, 18, 0, 0);
        assert_eq!(
            s.vault.deposit(&mut s.env, s.alice, s.alice, 1).unwrap(),
            10u128.pow(12)
        );
    }

    #[test]
    fn test_deposit_requires_allowance() {
        let mut s = setup();
        let bob = AccountId::new();
        let result = s.vault.deposit(&mut s.env, bob, bob, 1_000);
        assert!(matches!(
            result,
            Err(VaultError::Token(TokenError::InsufficientAllowance { .. }))
        ));
    }

    #[test]
    fn test_deposit_lower_vault_precision_rejects_zero_mint() {
        let mut s = setup_with(18, 6, 0, 0);
        let result = s.vault.deposit(&mut s.env, s.alice, s.alice, 999_999_999_999);
        assert_eq!(
            result,
            Err(VaultError::ZeroConversion {
                amount: 999_999_999_999
            })
        );
        assert_eq!(s.vault.total_assets(&s.env.tokens).unwrap(), 0);
    }

    #[test]
    fn test_deposit_paused() {
        let mut s = setup();
        s.vault.set_deposits_paused(&s.admin, true).unwrap();
        let result = s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000);
        assert_eq!(result, Err(VaultError::DepositsPaused));
        assert_eq!(result.unwrap_err().to_string(), "deposits not allowed");
        s.vault.set_deposits_paused(&s.admin, false).unwrap();
        assert!(s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000).is_ok());
    }

    // ─── Withdraw tests ───

    #[test]
    fn test_withdraw_pays_net_base() {
        let mut s = setup();
        let minted = s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000).unwrap();
        let bob = AccountId::new();
        let paid = s.vault.withdraw(&mut s.env, s.alice, bob, minted).unwrap();

        // 990_000 base equivalent, 1% withdraw fee
        assert_eq!(paid, 980_100);
        assert_eq!(base(&s, &bob), 980_100);
        assert_eq!(units(&s, &s.alice), 0);
        assert_eq!(s.env.tokens.total_supply(&TokenId::new("preUSDC")).unwrap(), 0);
    }

    #[test]
    fn test_withdraw_dust_fee_rejected() {
        let mut s = setup();
        s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000).unwrap();
        // 50 base units: 1% rounds to zero
        let result = s.vault.withdraw(&mut s.env, s.alice, s.alice, 50 * 10u128.pow(12));
        assert_eq!(result, Err(VaultError::ZeroFee));
    }

    #[test]
    fn test_withdraw_more_than_held() {
        let mut s = setup();
        let minted = s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000).unwrap();
        let result = s.vault.withdraw(&mut s.env, s.alice, s.alice, minted + 10u128.pow(14));
        assert!(matches!(
            result,
            Err(VaultError::Token(TokenError::InsufficientBalance { .. }))
        ));
    }

    #[test]
    fn test_withdraw_sub_unit_rejected() {
        let mut s = setup_with(6, 18, 0, 0);
        s.vault.deposit(&mut s.env, s.alice, s.alice, 1).unwrap();
        let result = s.vault.withdraw(&mut s.env, s.alice, s.alice, 10u128.pow(12) - 1);
        assert!(matches!(result, Err(VaultError::ZeroConversion { .. })));
    }

    #[test]
    fn test_withdraw_paused() {
        let mut s = setup();
        let minted = s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000).unwrap();
        s.vault.set_withdrawals_paused(&s.admin, true).unwrap();
        let result = s.vault.withdraw(&mut s.env, s.alice, s.alice, minted);
        assert_eq!(result, Err(VaultError::WithdrawalsPaused));
    }

    // ─── Hook tests ───

    #[derive(Debug)]
    struct Reject;

    impl Hook for Reject {
        fn account(&self) -> AccountId {
            AccountId::from_uuid(uuid::Uuid::nil())
        }

        fn hook(&self, _env: &mut Env, _call: &HookCall) -> Result<(), HookError> {
            Err(HookError::Rejected {
                reason: "closed".to_string(),
            })
        }
    }

    #[test]
    fn test_hook_failure_propagates() {
        let mut s = setup();
        s.vault
            .set_deposit_hook(&mut s.env, &s.admin, HookSlot::enabled(Reject))
            .unwrap();
        let result = s.vault.deposit(&mut s.env, s.alice, s.alice, 1_000_000);
        assert!(matches!(result, Err(VaultError::Hook(HookError::Rejected { .. }))));
    }

    // ─── Admin tests ───

    #[test]
    fn test_fee_setter_bounded_by_limit() {
        let mut s = setup();
        let result = s
            .vault
            .set_deposit_fee(&mut s.env, &s.admin, FeeRate::from_ppm(100_001));
        assert_eq!(
            result,
            Err(VaultError::FeeExceedsLimit {
                rate: 100_001,
                limit: 100_000
            })
        );
        s.vault
            .set_withdraw_fee(&mut s.env, &s.admin, FeeRate::DEFAULT_LIMIT)
            .unwrap();
        assert_eq!(s.vault.withdraw_fee_rate(), FeeRate::DEFAULT_LIMIT);
        assert!(s
            .env
            .pending_events()
            .iter()
            .any(|e| matches!(e.event, ContractEvent::FeeRateChanged(_))));
    }

    #[test]
    fn test_admin_setters_unauthorized() {
        let mut s = setup();
        let eve = AccountId::new();
        assert_eq!(
            s.vault.set_deposit_fee(&mut s.env, &eve, FeeRate::ZERO),
            Err(VaultError::Unauthorized)
        );
        assert_eq!(
            s.vault.set_deposit_hook(&mut s.env, &eve, HookSlot::Disabled),
            Err(VaultError::Unauthorized)
        );
        assert_eq!(s.vault.set_deposits_paused(&eve, true), Err(VaultError::Unauthorized));
    }

    #[test]
    fn test_new_rejects_fee_above_limit() {
        let admin = AccountId::new();
        let mut tokens = TokenRegistry::new();
        tokens
            .register(TokenLedger::new(TokenId::new("USDC"), 6, admin).unwrap())
            .unwrap();
        let config = VaultConfig {
            deposit_fee_rate: FeeRate::from_ppm(200_000),
            ..VaultConfig::default()
        };
        let result = CollateralVault::new(admin, &config, &mut tokens);
        assert!(matches!(result, Err(VaultError::FeeExceedsLimit { .. })));
    }

    #[test]
    fn test_total_assets_display() {
        let mut s = setup();
        s.vault.deposit(&mut s.env, s.alice, s.alice, 1_500_000).unwrap();
        assert_eq!(
            s.vault.total_assets_display(&s.env.tokens).unwrap(),
            Decimal::new(15, 1)
        );
    }
}
