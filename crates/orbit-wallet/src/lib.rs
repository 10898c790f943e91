//! Orbit Wallet - Custodial multi-asset wallet engine
//!
//! A [`CustodyWallet`] holds native currency, fungible tokens, and
//! non-fungible items on behalf of a designated **primary controller**,
//! while a **fee sink** account receives a registry-governed cut of every
//! native-currency inflow.
//!
//! Withdrawals pass through three independent authorization paths:
//!
//! - **Owner-direct**: the primary controller withdraws without allowance
//!   checks, subject only to availability.
//! - **Internally delegated**: a third party spends an allowance recorded in
//!   the wallet's own ledger, consumed by the withdrawal engine.
//! - **Externally delegated**: the controller forwards an approval to the
//!   token contract itself; the later pull transfer bypasses this engine
//!   entirely.
//!
//! Every operation either fully authorizes, fully transfers, and fully
//! updates the ledger, or fails with no state change.

use orbit_assets::AssetError;
use orbit_fees::FeeError;
use orbit_ledger::LedgerError;
use orbit_types::{Address, TokenId};
use thiserror::Error;

pub mod access;
pub mod allowance;
pub mod wallet;

pub use access::*;
pub use allowance::*;
pub use wallet::*;

/// Custody engine errors.
///
/// Variants keep four failure classes distinguishable: construction,
/// authorization (not-the-controller vs insufficient-allowance), request
/// validation, and availability of the requested asset.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    /// Construction error: a configuration argument is unusable.
    #[error("invalid wallet configuration: {field}")]
    InvalidConfiguration { field: &'static str },

    /// Authorization error: the caller is not the primary controller.
    #[error("caller {caller} is not the wallet controller")]
    NotController { caller: Address },

    /// Authorization error: no sufficient delegated allowance.
    #[error("insufficient allowance for spender {spender} on token {token}")]
    InsufficientAllowance { token: Address, spender: Address },

    /// Validation error: the recipient address is unusable.
    #[error("wrong recipient address: {recipient}")]
    InvalidRecipient { recipient: Address },

    /// Availability error: not enough native currency in custody.
    #[error("insufficient funds: have {available}, requested {requested}")]
    InsufficientFunds { available: u128, requested: u128 },

    /// Availability error: not enough fungible units in custody.
    #[error("not enough tokens to withdraw from {token}: have {available}, requested {requested}")]
    InsufficientTokenBalance {
        token: Address,
        available: u128,
        requested: u128,
    },

    /// Availability error: the wallet does not hold the requested item.
    #[error("no item {item} held from collection {token}")]
    ItemNotHeld { token: Address, item: TokenId },

    /// The fee rate source failed to answer.
    #[error(transparent)]
    FeeSource(#[from] FeeError),

    /// Native ledger failure (zero-value movement, overflow).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Token collaborator failure.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

pub type Result<T> = std::result::Result<T, WalletError>;
