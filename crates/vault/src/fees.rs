//! Manager and keeper fee buckets.

use crate::error::{VaultError, VaultResult};
use clmm_vault_domain::MathError;
use clmm_vault_domain::bps::BasisPoints;
use serde::{Deserialize, Serialize};

/// Split of one harvest between the buckets and the depositors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub manager0: u128,
    pub manager1: u128,
    pub keeper0: u128,
    pub keeper1: u128,
    /// Remainder credited to idle for redeployment.
    pub net0: u128,
    pub net1: u128,
}

impl FeeSplit {
    /// Splits harvested fees: `floor(F * bps / 10000)` to each bucket, the
    /// remainder to depositors.
    pub fn compute(
        fees0: u128,
        fees1: u128,
        manager_fee: BasisPoints,
        keeper_fee: BasisPoints,
    ) -> Result<Self, MathError> {
        let manager0 = manager_fee.apply(fees0)?;
        let manager1 = manager_fee.apply(fees1)?;
        let keeper0 = keeper_fee.apply(fees0)?;
        let keeper1 = keeper_fee.apply(fees1)?;
        Ok(Self {
            manager0,
            manager1,
            keeper0,
            keeper1,
            net0: fees0
                .checked_sub(manager0 + keeper0)
                .ok_or(MathError::Underflow)?,
            net1: fees1
                .checked_sub(manager1 + keeper1)
                .ok_or(MathError::Underflow)?,
        })
    }
}

/// Which bucket a withdrawal draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    Manager,
    Keeper,
}

/// Tracked fee balances. The tracked amounts, not the vault's token
/// balance, decide what can be withdrawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBuckets {
    pub manager0: u128,
    pub manager1: u128,
    pub keeper0: u128,
    pub keeper1: u128,
    /// Gross fees harvested over the vault's lifetime.
    pub harvested0: u128,
    pub harvested1: u128,
}

impl FeeBuckets {
    /// Records a harvest and credits both buckets.
    pub fn credit(&mut self, fees0: u128, fees1: u128, split: &FeeSplit) -> Result<(), MathError> {
        let mut next = self.clone();
        next.harvested0 = next.harvested0.checked_add(fees0).ok_or(MathError::Overflow)?;
        next.harvested1 = next.harvested1.checked_add(fees1).ok_or(MathError::Overflow)?;
        next.manager0 += split.manager0;
        next.manager1 += split.manager1;
        next.keeper0 += split.keeper0;
        next.keeper1 += split.keeper1;
        *self = next;
        Ok(())
    }

    pub fn balance(&self, bucket: Bucket, token0: bool) -> u128 {
        match (bucket, token0) {
            (Bucket::Manager, true) => self.manager0,
            (Bucket::Manager, false) => self.manager1,
            (Bucket::Keeper, true) => self.keeper0,
            (Bucket::Keeper, false) => self.keeper1,
        }
    }

    /// Debits `amount` from a bucket, failing if it holds less.
    pub fn withdraw(&mut self, bucket: Bucket, token0: bool, amount: u128) -> VaultResult<()> {
        let slot = match (bucket, token0) {
            (Bucket::Manager, true) => &mut self.manager0,
            (Bucket::Manager, false) => &mut self.manager1,
            (Bucket::Keeper, true) => &mut self.keeper0,
            (Bucket::Keeper, false) => &mut self.keeper1,
        };
        *slot = slot
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientFeeBalance {
                requested: amount,
                available: *slot,
            })?;
        Ok(())
    }

    /// Empties the manager bucket, returning what it held.
    pub fn drain_manager(&mut self) -> (u128, u128) {
        let drained = (self.manager0, self.manager1);
        self.manager0 = 0;
        self.manager1 = 0;
        drained
    }
}
