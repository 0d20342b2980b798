//! State lock held for the duration of a mutating operation.

use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutating entry points of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Mint,
    Burn,
    Rebalance,
    ExecutiveRebalance,
    WithdrawManagerBalance,
    WithdrawKeeperBalance,
    UpdateAdminParams,
    TransferOwnership,
    RenounceOwnership,
    ShareTransfer,
    ShareApproval,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Mint => "mint",
            Operation::Burn => "burn",
            Operation::Rebalance => "rebalance",
            Operation::ExecutiveRebalance => "executive_rebalance",
            Operation::WithdrawManagerBalance => "withdraw_manager_balance",
            Operation::WithdrawKeeperBalance => "withdraw_keeper_balance",
            Operation::UpdateAdminParams => "update_admin_params",
            Operation::TransferOwnership => "transfer_ownership",
            Operation::RenounceOwnership => "renounce_ownership",
            Operation::ShareTransfer => "share_transfer",
            Operation::ShareApproval => "share_approval",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReentrancyGuard {
    #[default]
    Settled,
    InFlight(Operation),
}

impl ReentrancyGuard {
    /// Takes the lock, failing if another operation holds it.
    pub fn enter(&mut self, operation: Operation) -> VaultResult<()> {
        match self {
            ReentrancyGuard::Settled => {
                *self = ReentrancyGuard::InFlight(operation);
                Ok(())
            }
            ReentrancyGuard::InFlight(_) => Err(VaultError::ReentrancyBlocked),
        }
    }

    pub fn exit(&mut self) {
        *self = ReentrancyGuard::Settled;
    }

    pub fn in_flight(&self) -> Option<Operation> {
        match self {
            ReentrancyGuard::Settled => None,
            ReentrancyGuard::InFlight(operation) => Some(*operation),
        }
    }
}
