//! Withdrawal Limits — rolling period windows over withdrawn volume
//!
//! - Global window against `max(configured limit, floor)` where the floor is
//!   `max(raw floor, percent floor * global net deposits)`
//! - Optional per-user window with its own period and limit
//! - Window resets when strictly more than `period_length` has elapsed
//! - Admin limit changes below the current floor are rejected

use std::collections::HashMap;
use tracing::{debug, info};
use types::fee::PERCENT_DENOMINATOR;
use types::ids::AccountId;
use types::numeric::mul_div;

use crate::config::WithdrawLimitConfig;
use crate::errors::WithdrawLimitError;
use crate::security::{AccessControl, Allowlist};

/// Withdrawn volume inside the current period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WithdrawWindow {
    amount_withdrawn_this_period: u128,
    /// `None` until the first withdrawal.
    last_period_reset: Option<i64>,
}

impl WithdrawWindow {
    pub fn amount_withdrawn_this_period(&self) -> u128 {
        self.amount_withdrawn_this_period
    }

    pub fn last_period_reset(&self) -> Option<i64> {
        self.last_period_reset
    }

    /// The window after withdrawing `amount` at `now`, without touching
    /// `self`. Starts a fresh period on the first withdrawal or once
    /// `now - last_period_reset > period_length`.
    pub fn accumulated(&self, now: i64, period_length: i64, amount: u128) -> Result<Self, WithdrawLimitError> {
        match self.last_period_reset {
            Some(reset) if now.saturating_sub(reset) <= period_length => {
                let total = self
                    .amount_withdrawn_this_period
                    .checked_add(amount)
                    .ok_or(types::errors::NumericError::Overflow)?;
                Ok(Self {
                    amount_withdrawn_this_period: total,
                    last_period_reset: Some(reset),
                })
            }
            _ => Ok(Self {
                amount_withdrawn_this_period: amount,
                last_period_reset: Some(now),
            }),
        }
    }
}

/// Usage reported after a withdrawal has been admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub withdrawn_this_period: u128,
    pub effective_limit: u128,
}

/// Rate limiter over global (and optionally per-user) withdrawals.
#[derive(Debug, Clone)]
pub struct WithdrawLimiter {
    config: WithdrawLimitConfig,
    global_window: WithdrawWindow,
    user_windows: HashMap<AccountId, WithdrawWindow>,
    allowed_callers: Allowlist,
    access_control: AccessControl,
}

impl WithdrawLimiter {
    pub fn new(admin: AccountId, config: WithdrawLimitConfig) -> Self {
        Self {
            config,
            global_window: WithdrawWindow::default(),
            user_windows: HashMap::new(),
            allowed_callers: Allowlist::new(),
            access_control: AccessControl::new(admin),
        }
    }

    /// `max(raw floor, percent floor * global net deposits)`
    pub fn effective_minimum(&self, global_net_deposited: u128) -> Result<u128, WithdrawLimitError> {
        let percent = mul_div(
            global_net_deposited,
            u128::from(self.config.percent_floor_ppm),
            PERCENT_DENOMINATOR,
        )?;
        Ok(self.config.raw_floor.max(percent))
    }

    /// `max(configured limit, effective minimum)`
    pub fn effective_limit(&self, global_net_deposited: u128) -> Result<u128, WithdrawLimitError> {
        Ok(self
            .config
            .global_limit
            .max(self.effective_minimum(global_net_deposited)?))
    }

    /// Admit a withdrawal of `amount` by `funder` at `now`.
    ///
    /// Both windows are computed and checked before either is stored, so a
    /// rejection leaves the limiter exactly as it was. Reaching the limit
    /// exactly is allowed.
    pub fn check_and_record(
        &mut self,
        caller: &AccountId,
        funder: AccountId,
        amount: u128,
        now: i64,
        global_net_deposited: u128,
    ) -> Result<WindowUsage, WithdrawLimitError> {
        if !self.allowed_callers.contains(caller) {
            return Err(WithdrawLimitError::CallerNotAllowed);
        }

        let limit = self.effective_limit(global_net_deposited)?;
        let global = self
            .global_window
            .accumulated(now, self.config.period_length, amount)?;
        if global.amount_withdrawn_this_period > limit {
            debug!(
                %funder,
                attempted = global.amount_withdrawn_this_period,
                limit,
                "global withdraw limit exceeded"
            );
            return Err(WithdrawLimitError::GlobalLimitExceeded {
                attempted: global.amount_withdrawn_this_period,
                limit,
            });
        }

        let user = match self.config.user_limit {
            Some(user_limit) => {
                let window = self
                    .user_window(&funder)
                    .accumulated(now, self.config.user_period_length, amount)?;
                if window.amount_withdrawn_this_period > user_limit {
                    debug!(
                        %funder,
                        attempted = window.amount_withdrawn_this_period,
                        limit = user_limit,
                        "user withdraw limit exceeded"
                    );
                    return Err(WithdrawLimitError::UserLimitExceeded {
                        attempted: window.amount_withdrawn_this_period,
                        limit: user_limit,
                    });
                }
                Some(window)
            }
            None => None,
        };

        self.global_window = global;
        if let Some(window) = user {
            self.user_windows.insert(funder, window);
        }

        Ok(WindowUsage {
            withdrawn_this_period: global.amount_withdrawn_this_period,
            effective_limit: limit,
        })
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn config(&self) -> &WithdrawLimitConfig {
        &self.config
    }

    pub fn global_window(&self) -> &WithdrawWindow {
        &self.global_window
    }

    pub fn user_window(&self, user: &AccountId) -> WithdrawWindow {
        self.user_windows.get(user).copied().unwrap_or_default()
    }

    pub fn is_allowed_caller(&self, caller: &AccountId) -> bool {
        self.allowed_callers.contains(caller)
    }

    // ───────────────────────── Admin ─────────────────────────

    /// Change the configured global limit. Rejected when below the current
    /// effective minimum.
    pub fn set_global_limit(
        &mut self,
        admin: &AccountId,
        limit: u128,
        global_net_deposited: u128,
    ) -> Result<(), WithdrawLimitError> {
        self.ensure_admin(admin)?;
        let minimum = self.effective_minimum(global_net_deposited)?;
        if limit < minimum {
            return Err(WithdrawLimitError::LimitBelowMinimum { limit, minimum });
        }
        info!(limit, minimum, "global withdraw limit changed");
        self.config.global_limit = limit;
        Ok(())
    }

    pub fn set_period_length(&mut self, admin: &AccountId, period_length: i64) -> Result<(), WithdrawLimitError> {
        self.ensure_admin(admin)?;
        if period_length <= 0 {
            return Err(WithdrawLimitError::InvalidPeriod { period_length });
        }
        self.config.period_length = period_length;
        Ok(())
    }

    pub fn set_floors(&mut self, admin: &AccountId, raw_floor: u128, percent_floor_ppm: u32) -> Result<(), WithdrawLimitError> {
        self.ensure_admin(admin)?;
        if u128::from(percent_floor_ppm) > PERCENT_DENOMINATOR {
            return Err(WithdrawLimitError::InvalidPercentFloor {
                ppm: percent_floor_ppm,
            });
        }
        self.config.raw_floor = raw_floor;
        self.config.percent_floor_ppm = percent_floor_ppm;
        Ok(())
    }

    pub fn set_user_limit(
        &mut self,
        admin: &AccountId,
        user_limit: Option<u128>,
        user_period_length: i64,
    ) -> Result<(), WithdrawLimitError> {
        self.ensure_admin(admin)?;
        if user_period_length <= 0 {
            return Err(WithdrawLimitError::InvalidPeriod {
                period_length: user_period_length,
            });
        }
        self.config.user_limit = user_limit;
        self.config.user_period_length = user_period_length;
        Ok(())
    }

    pub fn set_allowed_caller(
        &mut self,
        admin: &AccountId,
        caller: AccountId,
        allowed: bool,
    ) -> Result<(), WithdrawLimitError> {
        self.ensure_admin(admin)?;
        self.allowed_callers.set(caller, allowed);
        Ok(())
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), WithdrawLimitError> {
        if !self.access_control.is_admin(caller) {
            return Err(WithdrawLimitError::Unauthorized);
        }
        Ok(())
    }
}
