//! Non-fungible token collaborator
//!
//! Item-based asset contract: every unit is uniquely identified and tracked
//! individually, with per-item approvals and holder-wide operator approvals.

use std::collections::{HashMap, HashSet};

use orbit_types::{Address, TokenId};
use parking_lot::RwLock;
use tracing::debug;

use crate::{AssetError, AssetResult};

/// Surface every non-fungible token contract exposes to the custody engine.
pub trait NonFungibleToken: Send + Sync {
    /// Contract address, used to key allowance entries.
    fn address(&self) -> Address;

    /// Current holder of an item, if it exists.
    fn owner_of(&self, item: TokenId) -> Option<Address>;

    /// Number of items held by an account.
    fn balance_of(&self, account: &Address) -> u64;

    /// Move an item the caller holds to `to`.
    fn transfer(&self, caller: Address, to: Address, item: TokenId) -> AssetResult<()>;

    /// Move an item on behalf of its holder.
    ///
    /// The caller must be the holder, the item's approved spender, or an
    /// operator for the holder. A consumed per-item approval is cleared.
    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        item: TokenId,
    ) -> AssetResult<()>;

    /// Approve `spender` for a single item the caller holds.
    fn approve(&self, caller: Address, spender: Address, item: TokenId) -> AssetResult<()>;

    /// Grant or revoke `operator` authority over every item the caller holds.
    fn set_approval_for_all(
        &self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> AssetResult<()>;

    /// Approved spender for an item, if any.
    fn get_approved(&self, item: TokenId) -> Option<Address>;

    /// Whether `operator` holds collection-wide authority from `holder`.
    fn is_approved_for_all(&self, holder: &Address, operator: &Address) -> bool;
}

#[derive(Debug, Default)]
struct CollectionState {
    owners: HashMap<TokenId, Address>,
    balances: HashMap<Address, u64>,
    item_approvals: HashMap<TokenId, Address>,
    operator_approvals: HashSet<(Address, Address)>,
    next_id: u64,
}

/// In-memory mintable non-fungible collection.
///
/// Item ids are assigned sequentially from zero.
#[derive(Debug)]
pub struct StandardCollection {
    address: Address,
    symbol: String,
    state: RwLock<CollectionState>,
}

impl StandardCollection {
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            address: Address::derived(&format!("collection:{symbol}")),
            symbol,
            state: RwLock::new(CollectionState::default()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Mint the next item to `to` and return its id.
    pub fn mint(&self, to: Address) -> TokenId {
        let mut state = self.state.write();
        let item = TokenId::new(state.next_id);
        state.next_id += 1;
        state.owners.insert(item, to);
        *state.balances.entry(to).or_insert(0) += 1;
        debug!(collection = %self.address, %to, %item, "minted item");
        item
    }
}

impl CollectionState {
    fn move_item(&mut self, from: Address, to: Address, item: TokenId) -> AssetResult<()> {
        let holder = *self.owners.get(&item).ok_or(AssetError::UnknownItem { item })?;
        if holder != from {
            return Err(AssetError::NotHolder { item });
        }
        self.owners.insert(item, to);
        self.item_approvals.remove(&item);
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance -= 1;
        }
        *self.balances.entry(to).or_insert(0) += 1;
        Ok(())
    }
}

impl NonFungibleToken for StandardCollection {
    fn address(&self) -> Address {
        self.address
    }

    fn owner_of(&self, item: TokenId) -> Option<Address> {
        self.state.read().owners.get(&item).copied()
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.state.read().balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&self, caller: Address, to: Address, item: TokenId) -> AssetResult<()> {
        self.state.write().move_item(caller, to, item)
    }

    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        item: TokenId,
    ) -> AssetResult<()> {
        let mut state = self.state.write();
        let holder = *state.owners.get(&item).ok_or(AssetError::UnknownItem { item })?;
        let authorized = caller == holder
            || state.item_approvals.get(&item) == Some(&caller)
            || state.operator_approvals.contains(&(holder, caller));
        if !authorized {
            return Err(AssetError::NotAuthorized { item });
        }
        state.move_item(from, to, item)
    }

    fn approve(&self, caller: Address, spender: Address, item: TokenId) -> AssetResult<()> {
        let mut state = self.state.write();
        let holder = *state.owners.get(&item).ok_or(AssetError::UnknownItem { item })?;
        if caller != holder && !state.operator_approvals.contains(&(holder, caller)) {
            return Err(AssetError::NotHolder { item });
        }
        state.item_approvals.insert(item, spender);
        debug!(collection = %self.address, %spender, %item, "item approval set");
        Ok(())
    }

    fn set_approval_for_all(
        &self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> AssetResult<()> {
        let mut state = self.state.write();
        if approved {
            state.operator_approvals.insert((caller, operator));
        } else {
            state.operator_approvals.remove(&(caller, operator));
        }
        debug!(collection = %self.address, holder = %caller, %operator, approved, "operator approval");
        Ok(())
    }

    fn get_approved(&self, item: TokenId) -> Option<Address> {
        self.state.read().item_approvals.get(&item).copied()
    }

    fn is_approved_for_all(&self, holder: &Address, operator: &Address) -> bool {
        self.state
            .read()
            .operator_approvals
            .contains(&(*holder, *operator))
    }
}
