//! Fungible token collaborator
//!
//! Balance-based asset contract: interchangeable units tracked by quantity,
//! with holder-granted pull-transfer allowances.

use std::collections::HashMap;

use orbit_types::Address;
use parking_lot::RwLock;
use tracing::debug;

use crate::{AssetError, AssetResult};

/// Surface every fungible token contract exposes to the custody engine.
pub trait FungibleToken: Send + Sync {
    /// Contract address, used to key allowance entries.
    fn address(&self) -> Address;

    /// Balance held by an account.
    fn balance_of(&self, account: &Address) -> u128;

    /// Remaining pull-transfer allowance granted by `holder` to `spender`.
    fn allowance(&self, holder: &Address, spender: &Address) -> u128;

    /// Move `amount` from the caller's own balance to `to`.
    fn transfer(&self, caller: Address, to: Address, amount: u128) -> AssetResult<()>;

    /// Move `amount` from `from` to `to`, consuming the caller's allowance.
    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> AssetResult<()>;

    /// Set the caller's allowance for `spender` (overwrite, not additive).
    fn approve(&self, caller: Address, spender: Address, amount: u128) -> AssetResult<()>;
}

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl TokenState {
    fn move_balance(&mut self, from: Address, to: Address, amount: u128) -> AssetResult<()> {
        let from_balance = self.balances.get(&from).copied().unwrap_or(0);
        let remaining =
            from_balance
                .checked_sub(amount)
                .ok_or(AssetError::InsufficientBalance {
                    available: from_balance,
                    required: amount,
                })?;
        self.balances.insert(from, remaining);
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

/// In-memory mintable fungible token.
#[derive(Debug)]
pub struct StandardToken {
    address: Address,
    symbol: String,
    state: RwLock<TokenState>,
}

impl StandardToken {
    /// Create a token contract with a derived address.
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            address: Address::derived(&format!("fungible:{symbol}")),
            symbol,
            state: RwLock::new(TokenState::default()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Create new units out of thin air (tests and demos).
    pub fn mint(&self, to: Address, amount: u128) {
        let mut state = self.state.write();
        *state.balances.entry(to).or_insert(0) += amount;
        debug!(token = %self.address, %to, amount, "minted fungible units");
    }
}

impl FungibleToken for StandardToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.state.read().balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, holder: &Address, spender: &Address) -> u128 {
        self.state
            .read()
            .allowances
            .get(&(*holder, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&self, caller: Address, to: Address, amount: u128) -> AssetResult<()> {
        self.state.write().move_balance(caller, to, amount)
    }

    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> AssetResult<()> {
        let mut state = self.state.write();
        let approved = state.allowances.get(&(from, caller)).copied().unwrap_or(0);
        let remaining = approved
            .checked_sub(amount)
            .ok_or(AssetError::InsufficientAllowance {
                available: approved,
                required: amount,
            })?;
        state.move_balance(from, to, amount)?;
        state.allowances.insert((from, caller), remaining);
        Ok(())
    }

    fn approve(&self, caller: Address, spender: Address, amount: u128) -> AssetResult<()> {
        self.state.write().allowances.insert((caller, spender), amount);
        debug!(token = %self.address, holder = %caller, %spender, amount, "fungible approval set");
        Ok(())
    }
}
