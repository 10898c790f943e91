//! Orbit Fees - Fee rate governance
//!
//! A [`FeeRateRegistry`] holds a single basis-point fee rate in
//! `[0, 10_000]` and an administrator fixed at construction who may change
//! it. Wallets read the rate fresh on every deposit through the
//! [`FeeRateSource`] trait, so a rate change applies to all subsequent
//! deposits immediately.
//!
//! Splits use floor division: `fee = value * rate / 10_000`, and the
//! retained remainder always satisfies `retained + fee == value`.

use orbit_types::{Address, BPS_DENOMINATOR};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Upper bound of the fee rate, inclusive (100%).
pub const MAX_FEE_RATE_BPS: u32 = 10_000;

/// Fee governance errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("invalid fee rate: {rate} bps exceeds {MAX_FEE_RATE_BPS}")]
    InvalidRate { rate: u32 },

    #[error("caller {caller} is not the registry administrator")]
    NotAdministrator { caller: Address },

    #[error("fee computation overflow for value {value}")]
    Overflow { value: u128 },

    #[error("fee rate source unavailable: {reason}")]
    SourceUnavailable { reason: String },
}

pub type FeeResult<T> = std::result::Result<T, FeeError>;

/// Outcome of applying a fee rate to a deposit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Portion forwarded to the fee sink
    pub fee: u128,
    /// Portion retained in custody
    pub retained: u128,
}

/// Read-only rate query consumed by wallets.
///
/// The registry below is the canonical implementation; the trait exists so
/// a wallet depends on the rate query alone, not on registry administration.
pub trait FeeRateSource: Send + Sync {
    /// Address of the rate source contract.
    fn address(&self) -> Address;

    /// Current fee rate in basis points.
    fn fee_rate(&self) -> FeeResult<u32>;
}

/// Basis-point fee rate registry with an immutable administrator.
#[derive(Debug)]
pub struct FeeRateRegistry {
    address: Address,
    administrator: Address,
    rate_bps: RwLock<u32>,
}

impl FeeRateRegistry {
    /// Create a registry. The initial rate is validated against the same
    /// range as later updates; the administrator cannot be changed after
    /// construction.
    pub fn new(administrator: Address, initial_rate_bps: u32) -> FeeResult<Self> {
        ensure_rate(initial_rate_bps)?;
        Ok(Self {
            address: Address::derived(&format!("fee-registry:{administrator}")),
            administrator,
            rate_bps: RwLock::new(initial_rate_bps),
        })
    }

    /// The registry administrator.
    pub fn administrator(&self) -> Address {
        self.administrator
    }

    /// Replace the fee rate. Administrator-gated, range-checked; the prior
    /// rate is left untouched on any failure.
    pub fn set_fee_rate(&self, caller: Address, new_rate_bps: u32) -> FeeResult<()> {
        if caller != self.administrator {
            return Err(FeeError::NotAdministrator { caller });
        }
        ensure_rate(new_rate_bps)?;
        let mut rate = self.rate_bps.write();
        info!(registry = %self.address, old = *rate, new = new_rate_bps, "fee rate updated");
        *rate = new_rate_bps;
        Ok(())
    }
}

impl FeeRateSource for FeeRateRegistry {
    fn address(&self) -> Address {
        self.address
    }

    fn fee_rate(&self) -> FeeResult<u32> {
        Ok(*self.rate_bps.read())
    }
}

/// Split a deposit value at a basis-point rate, flooring the fee leg.
///
/// The rate is range-checked before use; the fee never exceeds the value.
pub fn split_value(value: u128, rate_bps: u32) -> FeeResult<FeeSplit> {
    ensure_rate(rate_bps)?;
    let fee = value
        .checked_mul(rate_bps as u128)
        .ok_or(FeeError::Overflow { value })?
        / BPS_DENOMINATOR;
    Ok(FeeSplit {
        fee,
        retained: value - fee,
    })
}

fn ensure_rate(rate_bps: u32) -> FeeResult<()> {
    if rate_bps > MAX_FEE_RATE_BPS {
        return Err(FeeError::InvalidRate { rate: rate_bps });
    }
    Ok(())
}
