//! Custody wallet
//!
//! The wallet instance ties the pieces together: the access-control guard,
//! the internal allowance book, the native-currency ledger handle, and the
//! fee-rate source. Deposits are intercepted and fee-split; withdrawals are
//! validated, executed, and settled against the allowance book.
//!
//! Execution is synchronous and call-serialized. Withdrawals commit
//! allowance consumption before the collaborator transfer, so a reentrant
//! call can never observe a stale, not-yet-decremented entry; if the
//! transfer itself fails afterwards, the consumed entry is restored from a
//! checkpoint before the error propagates, keeping the call all-or-nothing.

use std::sync::Arc;

use orbit_assets::{FungibleToken, NonFungibleToken};
use orbit_fees::{split_value, FeeRateSource};
use orbit_ledger::{DepositOutcome, EntryReason, NativeLedger};
use orbit_types::{Address, TokenId};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{AccessControl, AllowanceBook, Result, WalletError};

/// A custodial multi-asset wallet.
pub struct CustodyWallet {
    address: Address,
    access: AccessControl,
    fee_sink: Address,
    fee_source: Arc<dyn FeeRateSource>,
    ledger: Arc<NativeLedger>,
    allowances: RwLock<AllowanceBook>,
}

impl CustodyWallet {
    /// Create a wallet instance.
    ///
    /// The fee sink and the fee-rate source address must be non-zero, and
    /// the source must answer a rate probe; otherwise the instance never
    /// comes into existence.
    pub fn new(
        address: Address,
        primary_controller: Address,
        fee_source: Arc<dyn FeeRateSource>,
        fee_sink: Address,
        ledger: Arc<NativeLedger>,
    ) -> Result<Self> {
        if fee_sink.is_zero() {
            return Err(WalletError::InvalidConfiguration {
                field: "fee sink address",
            });
        }
        if fee_source.address().is_zero() {
            return Err(WalletError::InvalidConfiguration {
                field: "fee rate source address",
            });
        }
        fee_source.fee_rate()?;

        info!(wallet = %address, controller = %primary_controller, %fee_sink, "wallet created");
        Ok(Self {
            address,
            access: AccessControl::new(primary_controller),
            fee_sink,
            fee_source,
            ledger,
            allowances: RwLock::new(AllowanceBook::new()),
        })
    }

    // ── Read-only surface ─────────────────────────────────────────────────

    /// The wallet's own account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The primary controller.
    pub fn controller(&self) -> Address {
        self.access.controller()
    }

    /// Receiver of deposit fee proceeds.
    pub fn fee_sink(&self) -> Address {
        self.fee_sink
    }

    /// Address of the fee-rate source contract.
    pub fn fee_registry_address(&self) -> Address {
        self.fee_source.address()
    }

    /// Native currency held in custody.
    pub fn native_balance(&self) -> u128 {
        self.ledger.balance(&self.address)
    }

    /// Remaining internal fungible allowance for `(token, spender)`.
    pub fn fungible_allowance(&self, token: Address, spender: Address) -> u128 {
        self.allowances.read().fungible(token, spender)
    }

    /// Whether `item` is internally approved for `(token, spender)`.
    pub fn item_allowance(&self, token: Address, spender: Address, item: TokenId) -> bool {
        self.allowances.read().has_item(token, spender, item)
    }

    /// Whether the internal collection-wide flag is set for `(token, spender)`.
    pub fn collection_allowance(&self, token: Address, spender: Address) -> bool {
        self.allowances.read().has_collection(token, spender)
    }

    // ── Deposit interceptor ───────────────────────────────────────────────

    /// Receive native currency.
    ///
    /// The fee rate is read fresh from the source on every deposit; the fee
    /// portion (floored) is forwarded to the fee sink and the remainder is
    /// retained, as one atomic ledger movement.
    pub fn deposit(&self, from: Address, value: u128) -> Result<DepositOutcome> {
        let rate = self.fee_source.fee_rate()?;
        let split = split_value(value, rate)?;
        let outcome = self
            .ledger
            .deposit_split(from, self.address, self.fee_sink, value, split.fee)?;
        info!(
            wallet = %self.address,
            %from,
            value,
            fee = outcome.fee,
            retained = outcome.retained,
            rate_bps = rate,
            "deposit intercepted"
        );
        Ok(outcome)
    }

    // ── Withdrawal engine ─────────────────────────────────────────────────

    /// Withdraw native currency to `recipient`.
    ///
    /// Controller-only: no delegated path exists for native currency.
    pub fn withdraw_native(&self, caller: Address, recipient: Address, amount: u128) -> Result<()> {
        self.access.ensure_controller(caller)?;
        if recipient.is_zero() || recipient == self.address {
            return Err(WalletError::InvalidRecipient { recipient });
        }
        let available = self.native_balance();
        if available < amount {
            return Err(WalletError::InsufficientFunds {
                available,
                requested: amount,
            });
        }
        self.ledger.transfer(
            self.address,
            recipient,
            amount,
            EntryReason::Withdrawal {
                wallet: self.address,
            },
        )?;
        info!(wallet = %self.address, %recipient, amount, "native withdrawal");
        Ok(())
    }

    /// Withdraw fungible units to `recipient`.
    ///
    /// The controller withdraws freely; any other caller spends internal
    /// allowance, consumed by exactly the withdrawn amount on success.
    pub fn withdraw_fungible(
        &self,
        caller: Address,
        token: &dyn FungibleToken,
        recipient: Address,
        amount: u128,
    ) -> Result<()> {
        let token_addr = token.address();
        let delegated = !self.access.is_controller(caller);

        if delegated && self.allowances.read().fungible(token_addr, caller) < amount {
            return Err(WalletError::InsufficientAllowance {
                token: token_addr,
                spender: caller,
            });
        }

        let available = token.balance_of(&self.address);
        if available < amount {
            return Err(WalletError::InsufficientTokenBalance {
                token: token_addr,
                available,
                requested: amount,
            });
        }

        // Commit consumption before the collaborator call.
        let checkpoint = if delegated {
            let mut book = self.allowances.write();
            let prior = book.fungible(token_addr, caller);
            book.consume_fungible(token_addr, caller, amount).ok_or(
                WalletError::InsufficientAllowance {
                    token: token_addr,
                    spender: caller,
                },
            )?;
            Some(prior)
        } else {
            None
        };

        if let Err(err) = token.transfer(self.address, recipient, amount) {
            if let Some(prior) = checkpoint {
                self.allowances.write().set_fungible(token_addr, caller, prior);
            }
            warn!(wallet = %self.address, token = %token_addr, %err, "fungible transfer failed");
            return Err(err.into());
        }

        info!(
            wallet = %self.address,
            token = %token_addr,
            %caller,
            %recipient,
            amount,
            delegated,
            "fungible withdrawal"
        );
        Ok(())
    }

    /// Withdraw a non-fungible item to `recipient`.
    ///
    /// A delegated caller is authorized by the collection-wide flag or by a
    /// per-item approval. The collection flag is a standing grant and is
    /// never consumed; a per-item approval is removed once spent.
    pub fn withdraw_item(
        &self,
        caller: Address,
        token: &dyn NonFungibleToken,
        recipient: Address,
        item: TokenId,
    ) -> Result<()> {
        let token_addr = token.address();
        let delegated = !self.access.is_controller(caller);

        // Collection-wide authority is checked first; the per-item entry is
        // only the basis (and only consumed) when no standing grant exists.
        let via_item = if delegated {
            let book = self.allowances.read();
            if book.has_collection(token_addr, caller) {
                false
            } else if book.has_item(token_addr, caller, item) {
                true
            } else {
                return Err(WalletError::InsufficientAllowance {
                    token: token_addr,
                    spender: caller,
                });
            }
        } else {
            false
        };

        if token.owner_of(item) != Some(self.address) {
            return Err(WalletError::ItemNotHeld {
                token: token_addr,
                item,
            });
        }

        if via_item && !self.allowances.write().consume_item(token_addr, caller, item) {
            return Err(WalletError::InsufficientAllowance {
                token: token_addr,
                spender: caller,
            });
        }

        if let Err(err) = token.transfer(self.address, recipient, item) {
            if via_item {
                self.allowances.write().set_item(token_addr, caller, item, true);
            }
            warn!(wallet = %self.address, token = %token_addr, %item, %err, "item transfer failed");
            return Err(err.into());
        }

        info!(
            wallet = %self.address,
            token = %token_addr,
            %caller,
            %recipient,
            %item,
            delegated,
            "item withdrawal"
        );
        Ok(())
    }

    // ── Allowance grants: internal ledger ─────────────────────────────────

    /// Overwrite the internal fungible allowance for `(token, spender)`.
    pub fn grant_fungible_allowance(
        &self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: u128,
    ) -> Result<()> {
        self.access.ensure_controller(caller)?;
        self.allowances.write().set_fungible(token, spender, amount);
        info!(wallet = %self.address, %token, %spender, amount, "fungible allowance granted");
        Ok(())
    }

    /// Add or remove a single internal item approval.
    pub fn grant_item_allowance(
        &self,
        caller: Address,
        token: Address,
        spender: Address,
        item: TokenId,
        granted: bool,
    ) -> Result<()> {
        self.access.ensure_controller(caller)?;
        self.allowances.write().set_item(token, spender, item, granted);
        info!(wallet = %self.address, %token, %spender, %item, granted, "item allowance updated");
        Ok(())
    }

    /// Set or clear the internal collection-wide flag.
    pub fn grant_collection_allowance(
        &self,
        caller: Address,
        token: Address,
        spender: Address,
        granted: bool,
    ) -> Result<()> {
        self.access.ensure_controller(caller)?;
        self.allowances.write().set_collection(token, spender, granted);
        info!(wallet = %self.address, %token, %spender, granted, "collection allowance updated");
        Ok(())
    }

    // ── Allowance grants: external (token-contract) path ──────────────────

    /// Forward a fungible approval to the token contract itself.
    ///
    /// The spender can later pull funds straight from the wallet's balance
    /// through the token's own transfer-from surface; the internal ledger
    /// and the withdrawal engine are bypassed entirely.
    pub fn grant_external_fungible_allowance(
        &self,
        caller: Address,
        token: &dyn FungibleToken,
        spender: Address,
        amount: u128,
    ) -> Result<()> {
        self.access.ensure_controller(caller)?;
        token.approve(self.address, spender, amount)?;
        info!(wallet = %self.address, token = %token.address(), %spender, amount, "external fungible approval");
        Ok(())
    }

    /// Forward a per-item approval to the collection contract itself.
    pub fn grant_external_item_allowance(
        &self,
        caller: Address,
        token: &dyn NonFungibleToken,
        spender: Address,
        item: TokenId,
    ) -> Result<()> {
        self.access.ensure_controller(caller)?;
        token.approve(self.address, spender, item)?;
        info!(wallet = %self.address, token = %token.address(), %spender, %item, "external item approval");
        Ok(())
    }

    /// Forward a collection-wide operator approval to the contract itself.
    pub fn grant_external_collection_allowance(
        &self,
        caller: Address,
        token: &dyn NonFungibleToken,
        operator: Address,
        approved: bool,
    ) -> Result<()> {
        self.access.ensure_controller(caller)?;
        token.set_approval_for_all(self.address, operator, approved)?;
        info!(wallet = %self.address, token = %token.address(), %operator, approved, "external collection approval");
        Ok(())
    }
}
