//! Orbit Assets - Token collaborator contracts
//!
//! The custody engine never tracks token balances itself; it moves assets by
//! calling the token contracts that do. This crate defines those collaborator
//! surfaces as traits, plus in-memory mintable implementations used by tests
//! and demos.
//!
//! Both token kinds keep their own approval bookkeeping: an approval granted
//! here authorizes pull transfers that bypass the custody engine entirely.

use orbit_types::TokenId;
use thiserror::Error;

pub mod fungible;
pub mod nonfungible;

pub use fungible::*;
pub use nonfungible::*;

/// Errors raised by token collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: u128, required: u128 },

    #[error("unknown item: {item}")]
    UnknownItem { item: TokenId },

    #[error("caller is not the holder of item {item}")]
    NotHolder { item: TokenId },

    #[error("caller is not authorized to move item {item}")]
    NotAuthorized { item: TokenId },
}

pub type AssetResult<T> = std::result::Result<T, AssetError>;
