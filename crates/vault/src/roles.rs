//! Role capability checks.

use crate::error::{VaultError, VaultResult};
use clmm_vault_domain::Address;
use serde::{Deserialize, Serialize};

/// Capability required by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Owner of the vault: admin params, ownership, executive rebalance.
    Manager,
    /// Automated operator: rebalance and fee withdrawals.
    Keeper,
    /// Anyone.
    Open,
}

/// Current holders of the privileged roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    /// `None` once ownership has been renounced.
    pub manager: Option<Address>,
    pub keeper: Address,
}

impl Roles {
    pub fn new(manager: Option<Address>, keeper: Address) -> Self {
        Self { manager, keeper }
    }

    pub fn holds(&self, caller: Address, role: Role) -> bool {
        match role {
            Role::Manager => self.manager == Some(caller),
            Role::Keeper => self.keeper == caller,
            Role::Open => true,
        }
    }
}

/// Fails with `Unauthorized` unless `caller` holds `role`.
pub fn authorize(caller: Address, role: Role, roles: &Roles) -> VaultResult<()> {
    if roles.holds(caller, role) {
        Ok(())
    } else {
        Err(VaultError::Unauthorized { caller, role })
    }
}
