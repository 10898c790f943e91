//! Orbit Ledger - Native-currency ledger
//!
//! The ledger stands in for the hosting environment's native-balance
//! bookkeeping. It is:
//! - Account-keyed by [`Address`]
//! - Journaled (entries are append-only)
//! - Atomic (every movement commits fully under one lock or not at all)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Every entry has a reason
//! 3. Zero-amount entries are rejected
//! 4. Multi-leg movements (deposit splits) commit in a single lock scope

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use orbit_types::{Address, EntryId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in ledger operations
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("account not found: {account}")]
    AccountNotFound { account: Address },

    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("invalid amount: {message}")]
    InvalidAmount { message: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Direction of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Credit (increase) to an account
    Credit,
    /// Debit (decrease) from an account
    Debit,
}

/// Reason for a journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// External funding (tests and demos)
    Faucet,
    /// Retained portion of a deposit into a wallet
    Deposit { wallet: Address },
    /// Fee portion of a deposit, forwarded to the fee sink
    FeeForward { wallet: Address },
    /// Withdrawal out of a wallet
    Withdrawal { wallet: Address },
    /// Plain transfer between accounts
    Transfer,
}

/// A single journal entry (one side of a movement)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: EntryId,
    pub account: Address,
    pub kind: EntryKind,
    pub amount: u128,
    pub balance_after: u128,
    pub reason: EntryReason,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<Address, u128>,
    journal: Vec<JournalEntry>,
}

impl LedgerState {
    fn credit(&mut self, account: Address, amount: u128, reason: EntryReason) -> Result<EntryId> {
        let balance = self.accounts.entry(account).or_insert(0);
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                message: "balance overflow".to_string(),
            })?;
        *balance = new_balance;
        Ok(self.record(account, EntryKind::Credit, amount, new_balance, reason))
    }

    fn debit(&mut self, account: Address, amount: u128, reason: EntryReason) -> Result<EntryId> {
        let balance = self
            .accounts
            .get_mut(&account)
            .ok_or(LedgerError::AccountNotFound { account })?;
        let new_balance =
            balance
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    available: *balance,
                    required: amount,
                })?;
        *balance = new_balance;
        Ok(self.record(account, EntryKind::Debit, amount, new_balance, reason))
    }

    fn record(
        &mut self,
        account: Address,
        kind: EntryKind,
        amount: u128,
        balance_after: u128,
        reason: EntryReason,
    ) -> EntryId {
        let entry = JournalEntry {
            entry_id: EntryId::new(),
            account,
            kind,
            amount,
            balance_after,
            reason,
            created_at: Utc::now(),
        };
        let entry_id = entry.entry_id.clone();
        self.journal.push(entry);
        entry_id
    }
}

/// The Orbit native-currency ledger.
///
/// All mutating operations run to completion under a single write lock, so
/// no caller ever observes a half-applied movement.
#[derive(Debug, Default)]
pub struct NativeLedger {
    state: RwLock<LedgerState>,
}

/// Outcome of a fee-split deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositOutcome {
    /// Amount retained by the wallet account
    pub retained: u128,
    /// Amount forwarded to the fee sink
    pub fee: u128,
}

impl NativeLedger {
    /// Create a new in-memory ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the balance of an account
    pub fn balance(&self, account: &Address) -> u128 {
        self.state.read().accounts.get(account).copied().unwrap_or(0)
    }

    /// Credit an account from outside the system (tests and demos).
    pub fn fund(&self, account: Address, amount: u128) -> Result<EntryId> {
        ensure_nonzero(amount)?;
        self.state.write().credit(account, amount, EntryReason::Faucet)
    }

    /// Move value between two accounts.
    ///
    /// Atomic: the debit and credit happen together or neither does.
    pub fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: u128,
        reason: EntryReason,
    ) -> Result<(EntryId, EntryId)> {
        ensure_nonzero(amount)?;
        let mut state = self.state.write();
        let debit = state.debit(from, amount, reason.clone())?;
        let credit = state.credit(to, amount, reason)?;
        debug!(%from, %to, amount, "ledger transfer");
        Ok((debit, credit))
    }

    /// Move a deposit into a wallet account, splitting off the fee leg.
    ///
    /// Debits `value` from the depositor, credits `value - fee` to the
    /// wallet and `fee` to the fee sink, all in one lock scope. Legs of
    /// zero are skipped so the journal never carries zero-amount entries.
    pub fn deposit_split(
        &self,
        from: Address,
        wallet: Address,
        fee_sink: Address,
        value: u128,
        fee: u128,
    ) -> Result<DepositOutcome> {
        ensure_nonzero(value)?;
        if fee > value {
            return Err(LedgerError::InvalidAmount {
                message: format!("fee {} exceeds deposit value {}", fee, value),
            });
        }
        let retained = value - fee;

        let mut state = self.state.write();
        state.debit(from, value, EntryReason::Deposit { wallet })?;
        if retained > 0 {
            state.credit(wallet, retained, EntryReason::Deposit { wallet })?;
        }
        if fee > 0 {
            state.credit(fee_sink, fee, EntryReason::FeeForward { wallet })?;
        }
        debug!(%from, %wallet, %fee_sink, value, fee, retained, "deposit split");
        Ok(DepositOutcome { retained, fee })
    }

    /// All journal entries for an account
    pub fn account_entries(&self, account: &Address) -> Vec<JournalEntry> {
        self.state
            .read()
            .journal
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Recent journal entries (newest first)
    pub fn recent_entries(&self, limit: usize) -> Vec<JournalEntry> {
        self.state
            .read()
            .journal
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Total number of journal entries
    pub fn entry_count(&self) -> usize {
        self.state.read().journal.len()
    }
}

fn ensure_nonzero(amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount {
            message: "amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}
