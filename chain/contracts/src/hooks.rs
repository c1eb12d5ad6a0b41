//! Policy hooks
//!
//! A vault or market holds each hook in a [`HookSlot`]. Before invoking an
//! enabled hook the owner approves the hook's account for exactly the fee on
//! its custody account, and resets that allowance once the hook returns, so
//! a hook can never pull more than the fee it was called with.
//!
//! | Hook            | Ledgers touched                                   |
//! |-----------------|---------------------------------------------------|
//! | `DepositHook`   | deposit caps, treasury, reward distributor        |
//! | `WithdrawHook`  | rate windows, deposit caps, treasury, rewards     |
//! | `RedeemHook`    | treasury, reward distributor                      |
//! | `MintHook`      | none (allowlist check only)                       |

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use types::ids::{AccountId, TokenId};

use crate::env::Env;
use crate::errors::HookError;
use crate::events::{ContractEvent, FeeRouted, WithdrawalRecorded};
use crate::security::Allowlist;

/// Arguments passed to a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    /// Token the fee is denominated in.
    pub token: TokenId,
    /// Account holding the fee (vault or market custody).
    pub custodian: AccountId,
    /// Primary actor of the operation.
    pub funder: AccountId,
    pub recipient: AccountId,
    pub amount_before_fee: u128,
    pub amount_after_fee: u128,
}

impl HookCall {
    pub fn fee(&self) -> u128 {
        self.amount_before_fee.saturating_sub(self.amount_after_fee)
    }
}

/// Pluggable policy run inside a deposit, withdrawal, mint or redemption.
/// Returning an error aborts the whole operation.
pub trait Hook: fmt::Debug + Send + Sync {
    /// Identity the hook acts as on ledgers and allowlists.
    fn account(&self) -> AccountId;

    fn hook(&self, env: &mut Env, call: &HookCall) -> Result<(), HookError>;
}

/// Hook slot of a vault or market.
#[derive(Debug, Clone, Default)]
pub enum HookSlot {
    #[default]
    Disabled,
    Enabled(Arc<dyn Hook>),
}

impl HookSlot {
    pub fn enabled(hook: impl Hook + 'static) -> Self {
        HookSlot::Enabled(Arc::new(hook))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, HookSlot::Enabled(_))
    }

    pub fn account(&self) -> Option<AccountId> {
        match self {
            HookSlot::Disabled => None,
            HookSlot::Enabled(hook) => Some(hook.account()),
        }
    }

    /// Run the hook if one is set. Returns whether a hook ran.
    pub fn invoke(&self, env: &mut Env, call: &HookCall) -> Result<bool, HookError> {
        let HookSlot::Enabled(hook) = self else {
            return Ok(false);
        };
        let spender = hook.account();
        env.tokens
            .approve(&call.token, call.custodian, spender, call.fee())?;
        hook.hook(env, call)?;
        env.tokens.approve(&call.token, call.custodian, spender, 0)?;
        Ok(true)
    }
}

/// Forward the fee from the custodian to `treasury` and pay the funder a
/// reward for it.
fn route_fee(env: &mut Env, hook_account: AccountId, treasury: AccountId, call: &HookCall) -> Result<FeeRouted, HookError> {
    let fee = call.fee();
    let mut reward = 0;
    if fee > 0 {
        env.tokens
            .transfer_from(&call.token, &hook_account, &call.custodian, treasury, fee)?;

        if let Some(sender) = &env.token_sender {
            let sent = sender.send(&mut env.tokens, &hook_account, call.funder, fee)?;
            reward = sent.reward;
            env.emit(ContractEvent::RewardSent(sent));
        }
    }

    let routed = FeeRouted {
        token: call.token.clone(),
        funder: call.funder,
        treasury,
        fee,
        reward,
    };
    debug!(funder = %call.funder, %treasury, fee, reward, "fee routed");
    env.emit(ContractEvent::FeeRouted(routed.clone()));
    Ok(routed)
}

// ───────────────────────── Deposit ─────────────────────────

/// Records the deposit against the caps, then routes the fee.
#[derive(Debug, Clone)]
pub struct DepositHook {
    account: AccountId,
    treasury: AccountId,
}

impl DepositHook {
    pub fn new(treasury: AccountId) -> Self {
        Self {
            account: AccountId::new(),
            treasury,
        }
    }
}

impl Hook for DepositHook {
    fn account(&self) -> AccountId {
        self.account
    }

    fn hook(&self, env: &mut Env, call: &HookCall) -> Result<(), HookError> {
        let recorded = env.deposit_record.record_deposit(
            &self.account,
            call.funder,
            call.amount_before_fee,
            call.amount_after_fee,
        )?;
        env.emit(ContractEvent::DepositRecorded(recorded));
        route_fee(env, self.account, self.treasury, call)?;
        Ok(())
    }
}

// ───────────────────────── Withdraw ─────────────────────────

/// Admits the withdrawal through the rate windows, records it against the
/// deposit ledger, then routes the fee.
#[derive(Debug, Clone)]
pub struct WithdrawHook {
    account: AccountId,
    treasury: AccountId,
}

impl WithdrawHook {
    pub fn new(treasury: AccountId) -> Self {
        Self {
            account: AccountId::new(),
            treasury,
        }
    }
}

impl Hook for WithdrawHook {
    fn account(&self) -> AccountId {
        self.account
    }

    fn hook(&self, env: &mut Env, call: &HookCall) -> Result<(), HookError> {
        // The floor is taken against deposits before this withdrawal.
        let global_net = env.deposit_record.global_net_deposited();
        let now = env.now();
        let usage = env.withdraw_limiter.check_and_record(
            &self.account,
            call.funder,
            call.amount_before_fee,
            now,
            global_net,
        )?;
        let global_net_deposited = env
            .deposit_record
            .record_withdrawal(&self.account, call.amount_before_fee)?;

        info!(
            funder = %call.funder,
            amount = call.amount_before_fee,
            withdrawn_this_period = usage.withdrawn_this_period,
            effective_limit = usage.effective_limit,
            "withdrawal admitted"
        );
        env.emit(ContractEvent::WithdrawalRecorded(WithdrawalRecorded {
            funder: call.funder,
            amount: call.amount_before_fee,
            withdrawn_this_period: usage.withdrawn_this_period,
            effective_limit: usage.effective_limit,
            global_net_deposited,
        }));
        route_fee(env, self.account, self.treasury, call)?;
        Ok(())
    }
}

// ───────────────────────── Redeem ─────────────────────────

/// Routes a market redemption fee.
#[derive(Debug, Clone)]
pub struct RedeemHook {
    account: AccountId,
    treasury: AccountId,
}

impl RedeemHook {
    pub fn new(treasury: AccountId) -> Self {
        Self {
            account: AccountId::new(),
            treasury,
        }
    }
}

impl Hook for RedeemHook {
    fn account(&self) -> AccountId {
        self.account
    }

    fn hook(&self, env: &mut Env, call: &HookCall) -> Result<(), HookError> {
        route_fee(env, self.account, self.treasury, call)?;
        Ok(())
    }
}

// ───────────────────────── Mint ─────────────────────────

/// Restricts market minting to an allowlist.
#[derive(Debug, Clone)]
pub struct MintHook {
    account: AccountId,
    allowed: Allowlist,
}

impl MintHook {
    pub fn new(allowed: Allowlist) -> Self {
        Self {
            account: AccountId::new(),
            allowed,
        }
    }
}

impl Hook for MintHook {
    fn account(&self) -> AccountId {
        self.account
    }

    fn hook(&self, _env: &mut Env, call: &HookCall) -> Result<(), HookError> {
        if !self.allowed.contains(&call.funder) {
            return Err(HookError::AccountNotAllowed {
                account: call.funder.to_string(),
            });
        }
        Ok(())
    }
}
