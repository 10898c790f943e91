//! Internal allowance ledger
//!
//! Delegated withdrawal rights recorded inside the wallet, keyed by
//! `(token contract, spender)`. Fungible entries hold a remaining amount;
//! non-fungible delegation uses two independent channels per key: a set of
//! individually approved item ids and a collection-wide flag. The channels
//! are granted, revoked, and checked separately; clearing one never touches
//! the other.

use std::collections::{HashMap, HashSet};

use orbit_types::{Address, TokenId};
use serde::{Deserialize, Serialize};

/// Key of a delegation entry: (token contract, spender).
pub type AllowanceKey = (Address, Address);

/// Per-wallet store of internally delegated withdrawal rights.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowanceBook {
    fungible: HashMap<AllowanceKey, u128>,
    items: HashMap<AllowanceKey, HashSet<TokenId>>,
    collections: HashSet<AllowanceKey>,
}

impl AllowanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Fungible entries ──────────────────────────────────────────────────

    /// Remaining approved amount for `(token, spender)`.
    pub fn fungible(&self, token: Address, spender: Address) -> u128 {
        self.fungible.get(&(token, spender)).copied().unwrap_or(0)
    }

    /// Overwrite the remaining amount for `(token, spender)`.
    pub fn set_fungible(&mut self, token: Address, spender: Address, amount: u128) {
        self.fungible.insert((token, spender), amount);
    }

    /// Consume `amount` from the entry, returning the new remainder.
    ///
    /// `None` means the remaining amount was insufficient; the entry is
    /// untouched in that case.
    pub fn consume_fungible(
        &mut self,
        token: Address,
        spender: Address,
        amount: u128,
    ) -> Option<u128> {
        let entry = self.fungible.entry((token, spender)).or_insert(0);
        let remaining = entry.checked_sub(amount)?;
        *entry = remaining;
        Some(remaining)
    }

    // ── Non-fungible entries ──────────────────────────────────────────────

    /// Whether `item` is individually approved for `(token, spender)`.
    pub fn has_item(&self, token: Address, spender: Address, item: TokenId) -> bool {
        self.items
            .get(&(token, spender))
            .is_some_and(|set| set.contains(&item))
    }

    /// Add or remove a single item approval. Removal of an absent item is a
    /// no-op, so revocation is idempotent.
    pub fn set_item(&mut self, token: Address, spender: Address, item: TokenId, granted: bool) {
        if granted {
            self.items.entry((token, spender)).or_default().insert(item);
        } else if let Some(set) = self.items.get_mut(&(token, spender)) {
            set.remove(&item);
        }
    }

    /// Remove a consumed item approval. Returns whether it was present.
    pub fn consume_item(&mut self, token: Address, spender: Address, item: TokenId) -> bool {
        self.items
            .get_mut(&(token, spender))
            .is_some_and(|set| set.remove(&item))
    }

    /// Whether the collection-wide flag is set for `(token, spender)`.
    pub fn has_collection(&self, token: Address, spender: Address) -> bool {
        self.collections.contains(&(token, spender))
    }

    /// Set or clear the collection-wide flag. Independent of item entries.
    pub fn set_collection(&mut self, token: Address, spender: Address, granted: bool) {
        if granted {
            self.collections.insert((token, spender));
        } else {
            self.collections.remove(&(token, spender));
        }
    }
}
