//! Fungible token ledgers
//!
//! Models the base asset, the vault unit, the reward token and every market's
//! long/short claim tokens. Each ledger has exactly one minter; for the vault
//! unit that is the vault's custody account, for claim tokens it is the
//! owning market.

use std::collections::HashMap;
use types::ids::{AccountId, TokenId};
use types::numeric::MAX_TOKEN_DECIMALS;

use crate::errors::TokenError;

/// Balances, allowances and supply of a single token.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    id: TokenId,
    decimals: u8,
    minter: AccountId,
    balances: HashMap<AccountId, u128>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(AccountId, AccountId), u128>,
    total_supply: u128,
}

impl TokenLedger {
    pub fn new(id: TokenId, decimals: u8, minter: AccountId) -> Result<Self, TokenError> {
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(TokenError::InvalidDecimals { decimals });
        }
        Ok(Self {
            id,
            decimals,
            minter,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        })
    }

    pub fn id(&self) -> &TokenId {
        &self.id
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn minter(&self) -> &AccountId {
        &self.minter
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Create `amount` new units for `to`. Minter only.
    pub fn mint(&mut self, caller: &AccountId, to: AccountId, amount: u128) -> Result<(), TokenError> {
        self.ensure_minter(caller)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        // Every balance is bounded by the supply, so this cannot overflow.
        *self.balances.entry(to).or_insert(0) += amount;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Destroy `amount` units held by `from`. Minter only; no allowance needed.
    pub fn burn(&mut self, caller: &AccountId, from: &AccountId, amount: u128) -> Result<(), TokenError> {
        self.ensure_minter(caller)?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: &AccountId, to: AccountId, amount: u128) -> Result<(), TokenError> {
        self.debit(from, amount)?;
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    /// Set the allowance `spender` may pull from `owner`.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. Both balance and allowance are checked before either is
    /// touched.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                token: self.id.to_string(),
                required: amount,
                available: allowed,
            });
        }
        self.ensure_balance(from, amount)?;

        self.approve(*from, *spender, allowed - amount);
        self.transfer(from, to, amount)
    }

    fn ensure_minter(&self, caller: &AccountId) -> Result<(), TokenError> {
        if self.minter != *caller {
            return Err(TokenError::NotMinter {
                token: self.id.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_balance(&self, account: &AccountId, amount: u128) -> Result<(), TokenError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                token: self.id.to_string(),
                required: amount,
                available,
            });
        }
        Ok(())
    }

    fn debit(&mut self, account: &AccountId, amount: u128) -> Result<(), TokenError> {
        self.ensure_balance(account, amount)?;
        if let Some(balance) = self.balances.get_mut(account) {
            *balance -= amount;
            if *balance == 0 {
                self.balances.remove(account);
            }
        }
        Ok(())
    }
}

/// All token ledgers known to the host environment, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<TokenId, TokenLedger>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new token. Symbols are unique.
    pub fn register(&mut self, ledger: TokenLedger) -> Result<(), TokenError> {
        if self.tokens.contains_key(ledger.id()) {
            return Err(TokenError::AlreadyRegistered {
                token: ledger.id().to_string(),
            });
        }
        self.tokens.insert(ledger.id().clone(), ledger);
        Ok(())
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn get(&self, token: &TokenId) -> Result<&TokenLedger, TokenError> {
        self.tokens.get(token).ok_or_else(|| TokenError::UnknownToken {
            token: token.to_string(),
        })
    }

    pub fn get_mut(&mut self, token: &TokenId) -> Result<&mut TokenLedger, TokenError> {
        self.tokens
            .get_mut(token)
            .ok_or_else(|| TokenError::UnknownToken {
                token: token.to_string(),
            })
    }

    pub fn decimals(&self, token: &TokenId) -> Result<u8, TokenError> {
        Ok(self.get(token)?.decimals())
    }

    pub fn balance_of(&self, token: &TokenId, account: &AccountId) -> Result<u128, TokenError> {
        Ok(self.get(token)?.balance_of(account))
    }

    pub fn total_supply(&self, token: &TokenId) -> Result<u128, TokenError> {
        Ok(self.get(token)?.total_supply())
    }

    pub fn mint(
        &mut self,
        token: &TokenId,
        caller: &AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.mint(caller, to, amount)
    }

    pub fn burn(
        &mut self,
        token: &TokenId,
        caller: &AccountId,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.burn(caller, from, amount)
    }

    pub fn transfer(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.transfer(from, to, amount)
    }

    pub fn approve(
        &mut self,
        token: &TokenId,
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.approve(owner, spender, amount);
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        token: &TokenId,
        spender: &AccountId,
        from: &AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.transfer_from(spender, from, to, amount)
    }
}
