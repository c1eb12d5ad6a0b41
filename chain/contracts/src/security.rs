//! Shared security primitives for contract modules
//!
//! Provides the admin check, account allowlists and pause switches used
//! across the vault, the ledgers and the markets.

use std::collections::HashSet;
use types::ids::AccountId;

/// Single-admin access control.
///
/// Administrative setters (fees, caps, limits, hooks, allowlists) are gated
/// on the caller being the current admin.
#[derive(Debug, Clone)]
pub struct AccessControl {
    admin: AccountId,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: AccountId) -> Self {
        Self { admin }
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &AccountId) -> bool {
        self.admin == *caller
    }

    /// Transfer admin to a new account. Returns `false` if the caller is not
    /// the current admin.
    pub fn transfer_admin(&mut self, current_admin: &AccountId, new_admin: AccountId) -> bool {
        if !self.is_admin(current_admin) {
            return false;
        }
        self.admin = new_admin;
        true
    }

    /// Get the current admin identifier.
    pub fn admin(&self) -> &AccountId {
        &self.admin
    }
}

/// Set of accounts allowed through some gate (allowed callers, cap bypass,
/// mint allowlist).
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    accounts: HashSet<AccountId>,
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include or exclude an account. Returns `true` if membership changed.
    pub fn set(&mut self, account: AccountId, included: bool) -> bool {
        if included {
            self.accounts.insert(account)
        } else {
            self.accounts.remove(&account)
        }
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.accounts.contains(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl FromIterator<AccountId> for Allowlist {
    fn from_iter<I: IntoIterator<Item = AccountId>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().collect(),
        }
    }
}

/// Composable pause switch.
///
/// When paused, protected operations must be rejected.
#[derive(Debug, Clone)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self { paused: false }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for PauseGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- AccessControl tests ---

    #[test]
    fn test_access_control_admin() {
        let alice = AccountId::new();
        let bob = AccountId::new();
        let ac = AccessControl::new(alice);
        assert!(ac.is_admin(&alice));
        assert!(!ac.is_admin(&bob));
    }

    #[test]
    fn test_access_control_transfer_admin() {
        let alice = AccountId::new();
        let bob = AccountId::new();
        let mut ac = AccessControl::new(alice);
        assert!(ac.transfer_admin(&alice, bob));
        assert!(ac.is_admin(&bob));
        assert!(!ac.is_admin(&alice));
        assert_eq!(ac.admin(), &bob);
    }

    #[test]
    fn test_access_control_transfer_requires_admin() {
        let alice = AccountId::new();
        let eve = AccountId::new();
        let mut ac = AccessControl::new(alice);
        assert!(!ac.transfer_admin(&eve, eve));
        assert!(ac.is_admin(&alice));
    }

    // --- Allowlist tests ---

    #[test]
    fn test_allowlist_set_and_remove() {
        let mut list = Allowlist::new();
        let acc = AccountId::new();
        assert!(list.set(acc, true));
        assert!(!list.set(acc, true), "Second insert is a no-op");
        assert!(list.contains(&acc));
        assert!(list.set(acc, false));
        assert!(list.is_empty());
    }

    #[test]
    fn test_allowlist_from_iter() {
        let a = AccountId::new();
        let b = AccountId::new();
        let list: Allowlist = [a, b].into_iter().collect();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&b));
    }

    // --- PauseGuard tests ---

    #[test]
    fn test_pause_guard() {
        let mut pg = PauseGuard::new();
        assert!(!pg.is_paused());
        pg.pause();
        assert!(pg.is_paused());
        pg.unpause();
        assert!(!pg.is_paused());
    }
}
