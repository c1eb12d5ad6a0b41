//! Deposit Record — global and per-user deposit caps
//!
//! Two counters with different update rules live here and are kept as
//! distinct types:
//! - [`NetCounter`]: global net deposits, grows on deposit and shrinks
//!   (clamped at zero) on withdrawal
//! - [`GrossRatchet`]: lifetime gross deposits per user, never shrinks
//!
//! Only allowlisted callers (the vault's hooks) may record.

use std::collections::HashMap;
use tracing::{debug, info};
use types::ids::AccountId;

use crate::config::DepositCapConfig;
use crate::errors::DepositRecordError;
use crate::events::DepositRecorded;
use crate::security::{AccessControl, Allowlist};

/// Net amount currently deposited; never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NetCounter(u128);

impl NetCounter {
    pub fn get(&self) -> u128 {
        self.0
    }

    /// Counter after adding `amount`, or `None` on overflow.
    pub fn increased_by(&self, amount: u128) -> Option<Self> {
        self.0.checked_add(amount).map(Self)
    }

    /// Counter after removing `amount`, floored at zero.
    pub fn decreased_by(&self, amount: u128) -> Self {
        Self(self.0.saturating_sub(amount))
    }
}

/// Lifetime deposit volume; only ever ratchets up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GrossRatchet(u128);

impl GrossRatchet {
    pub fn get(&self) -> u128 {
        self.0
    }

    /// Ratchet after adding `amount`, or `None` on overflow.
    pub fn ratcheted_by(&self, amount: u128) -> Option<Self> {
        self.0.checked_add(amount).map(Self)
    }
}

/// Cumulative deposit ledger enforcing the global and per-user caps.
#[derive(Debug, Clone)]
pub struct DepositRecord {
    global_net_deposited: NetCounter,
    global_cap: u128,
    user_deposits: HashMap<AccountId, GrossRatchet>,
    user_cap: u128,
    /// Accounts exempt from the user cap (never from the global cap)
    bypass: Allowlist,
    allowed_callers: Allowlist,
    access_control: AccessControl,
}

impl DepositRecord {
    pub fn new(admin: AccountId, config: &DepositCapConfig) -> Self {
        Self {
            global_net_deposited: NetCounter::default(),
            global_cap: config.global_cap,
            user_deposits: HashMap::new(),
            user_cap: config.user_cap,
            bypass: Allowlist::new(),
            allowed_callers: Allowlist::new(),
            access_control: AccessControl::new(admin),
        }
    }

    /// Record a deposit by `user`.
    ///
    /// The global counter grows by the post-fee amount (what the vault keeps
    /// backing), the user's ratchet by the pre-fee amount (what they sent).
    /// Both caps are checked before either counter moves; exactly reaching a
    /// cap is allowed.
    pub fn record_deposit(
        &mut self,
        caller: &AccountId,
        user: AccountId,
        amount_before_fee: u128,
        amount_after_fee: u128,
    ) -> Result<DepositRecorded, DepositRecordError> {
        self.ensure_allowed(caller)?;

        let new_global = self
            .global_net_deposited
            .increased_by(amount_after_fee)
            .ok_or(DepositRecordError::Overflow)?;
        if new_global.get() > self.global_cap {
            debug!(%user, attempted = new_global.get(), cap = self.global_cap, "global cap exceeded");
            return Err(DepositRecordError::GlobalCapExceeded {
                attempted: new_global.get(),
                cap: self.global_cap,
            });
        }

        let new_user = self
            .user_deposits(&user)
            .ratcheted_by(amount_before_fee)
            .ok_or(DepositRecordError::Overflow)?;
        if !self.bypass.contains(&user) && new_user.get() > self.user_cap {
            debug!(%user, attempted = new_user.get(), cap = self.user_cap, "user cap exceeded");
            return Err(DepositRecordError::UserCapExceeded {
                attempted: new_user.get(),
                cap: self.user_cap,
            });
        }

        self.global_net_deposited = new_global;
        self.user_deposits.insert(user, new_user);

        Ok(DepositRecorded {
            user,
            amount_before_fee,
            amount_after_fee,
            global_net_deposited: new_global.get(),
            user_gross_deposited: new_user.get(),
        })
    }

    /// Record a withdrawal. The global counter is floored at zero and user
    /// ratchets are untouched.
    pub fn record_withdrawal(&mut self, caller: &AccountId, amount: u128) -> Result<u128, DepositRecordError> {
        self.ensure_allowed(caller)?;
        self.global_net_deposited = self.global_net_deposited.decreased_by(amount);
        Ok(self.global_net_deposited.get())
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn global_net_deposited(&self) -> u128 {
        self.global_net_deposited.get()
    }

    pub fn global_cap(&self) -> u128 {
        self.global_cap
    }

    pub fn user_cap(&self) -> u128 {
        self.user_cap
    }

    pub fn user_deposits(&self, user: &AccountId) -> GrossRatchet {
        self.user_deposits.get(user).copied().unwrap_or_default()
    }

    pub fn is_bypassed(&self, user: &AccountId) -> bool {
        self.bypass.contains(user)
    }

    pub fn is_allowed_caller(&self, caller: &AccountId) -> bool {
        self.allowed_callers.contains(caller)
    }

    // ───────────────────────── Admin ─────────────────────────

    pub fn set_global_cap(&mut self, admin: &AccountId, cap: u128) -> Result<(), DepositRecordError> {
        self.ensure_admin(admin)?;
        info!(cap, "global deposit cap changed");
        self.global_cap = cap;
        Ok(())
    }

    pub fn set_user_cap(&mut self, admin: &AccountId, cap: u128) -> Result<(), DepositRecordError> {
        self.ensure_admin(admin)?;
        info!(cap, "user deposit cap changed");
        self.user_cap = cap;
        Ok(())
    }

    pub fn set_bypass(&mut self, admin: &AccountId, user: AccountId, bypassed: bool) -> Result<(), DepositRecordError> {
        self.ensure_admin(admin)?;
        self.bypass.set(user, bypassed);
        Ok(())
    }

    pub fn set_allowed_caller(
        &mut self,
        admin: &AccountId,
        caller: AccountId,
        allowed: bool,
    ) -> Result<(), DepositRecordError> {
        self.ensure_admin(admin)?;
        self.allowed_callers.set(caller, allowed);
        Ok(())
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), DepositRecordError> {
        if !self.access_control.is_admin(caller) {
            return Err(DepositRecordError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_allowed(&self, caller: &AccountId) -> Result<(), DepositRecordError> {
        if !self.allowed_callers.contains(caller) {
            return Err(DepositRecordError::CallerNotAllowed);
        }
        Ok(())
    }
}
