//! Host environment shared by the vault, the markets and their hooks
//!
//! Holds every ledger a hook may touch plus the clock. Events raised during
//! a unit of work are buffered here and only reach the audit trail when the
//! protocol commits; a failed unit of work drops them with the staged copy.

use tracing::debug;

use crate::audit::PendingEvent;
use crate::deposit_record::DepositRecord;
use crate::events::ContractEvent;
use crate::token::TokenRegistry;
use crate::token_sender::TokenSender;
use crate::withdrawal::WithdrawLimiter;

#[derive(Debug, Clone)]
pub struct Env {
    pub tokens: TokenRegistry,
    pub deposit_record: DepositRecord,
    pub withdraw_limiter: WithdrawLimiter,
    /// Reward distributor; `None` until one is installed.
    pub token_sender: Option<TokenSender>,
    pending: Vec<PendingEvent>,
    /// Unix seconds.
    now: i64,
}

impl Env {
    pub fn new(tokens: TokenRegistry, deposit_record: DepositRecord, withdraw_limiter: WithdrawLimiter) -> Self {
        Self {
            tokens,
            deposit_record,
            withdraw_limiter,
            token_sender: None,
            pending: Vec::new(),
            now: 0,
        }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn set_time(&mut self, now: i64) {
        self.now = now;
    }

    /// Buffer an event stamped with the current time.
    pub fn emit(&mut self, event: ContractEvent) {
        debug!(pending = self.pending.len(), event = event.label(), "event emitted");
        self.pending.push(PendingEvent {
            timestamp: self.now,
            event,
        });
    }

    /// Events raised since the last commit.
    pub fn pending_events(&self) -> &[PendingEvent] {
        &self.pending
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingEvent> {
        std::mem::take(&mut self.pending)
    }
}
