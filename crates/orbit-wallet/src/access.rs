//! Access control
//!
//! Exactly two privileged roles exist relative to a wallet instance: the
//! primary controller (the designated user, sole grantor of allowances and
//! default authorized withdrawer) and the fee sink (receiver of deposit fee
//! proceeds). The fee sink is passive here: holding it never authorizes a
//! withdrawal through this engine.

use orbit_types::Address;
use serde::{Deserialize, Serialize};

use crate::{Result, WalletError};

/// Role guard for a wallet instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControl {
    primary_controller: Address,
}

impl AccessControl {
    pub fn new(primary_controller: Address) -> Self {
        Self { primary_controller }
    }

    /// The wallet's designated user.
    pub fn controller(&self) -> Address {
        self.primary_controller
    }

    pub fn is_controller(&self, caller: Address) -> bool {
        caller == self.primary_controller
    }

    /// Fail unless the caller is the primary controller.
    pub fn ensure_controller(&self, caller: Address) -> Result<()> {
        if !self.is_controller(caller) {
            return Err(WalletError::NotController { caller });
        }
        Ok(())
    }
}
