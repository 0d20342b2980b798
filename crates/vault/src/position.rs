//! The vault's single range position and its undeployed balances.

use crate::error::{VaultError, VaultResult};
use clmm_vault_domain::math::tick_math::{get_sqrt_ratio_at_tick, is_usable_tick};
use clmm_vault_domain::{MathError, U256};
use serde::{Deserialize, Serialize};

/// Validates a `[lower, upper)` range against the pool's tick spacing.
pub fn validate_range(lower: i32, upper: i32, tick_spacing: i32) -> VaultResult<()> {
    if lower < upper && is_usable_tick(lower, tick_spacing) && is_usable_tick(upper, tick_spacing)
    {
        Ok(())
    } else {
        Err(VaultError::InvalidRange { lower, upper })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLedger {
    pub lower_tick: i32,
    pub upper_tick: i32,
    /// Liquidity deployed in `[lower_tick, upper_tick)`.
    pub liquidity: u128,
    /// Token0 held by the vault for depositors, not deployed.
    pub idle0: u128,
    /// Token1 held by the vault for depositors, not deployed.
    pub idle1: u128,
}

impl PositionLedger {
    pub fn new(lower_tick: i32, upper_tick: i32) -> Self {
        Self {
            lower_tick,
            upper_tick,
            liquidity: 0,
            idle0: 0,
            idle1: 0,
        }
    }

    /// Sqrt prices of the range bounds.
    pub fn sqrt_ratios(&self) -> Result<(U256, U256), MathError> {
        Ok((
            get_sqrt_ratio_at_tick(self.lower_tick)?,
            get_sqrt_ratio_at_tick(self.upper_tick)?,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.idle0 == 0 && self.idle1 == 0
    }

    pub fn credit_idle(&mut self, amount0: u128, amount1: u128) -> Result<(), MathError> {
        let idle0 = self.idle0.checked_add(amount0).ok_or(MathError::Overflow)?;
        let idle1 = self.idle1.checked_add(amount1).ok_or(MathError::Overflow)?;
        self.idle0 = idle0;
        self.idle1 = idle1;
        Ok(())
    }

    pub fn debit_idle(&mut self, amount0: u128, amount1: u128) -> Result<(), MathError> {
        let idle0 = self.idle0.checked_sub(amount0).ok_or(MathError::Underflow)?;
        let idle1 = self.idle1.checked_sub(amount1).ok_or(MathError::Underflow)?;
        self.idle0 = idle0;
        self.idle1 = idle1;
        Ok(())
    }

    pub fn add_liquidity(&mut self, liquidity: u128) -> Result<(), MathError> {
        self.liquidity = self
            .liquidity
            .checked_add(liquidity)
            .ok_or(MathError::Overflow)?;
        Ok(())
    }

    pub fn remove_liquidity(&mut self, liquidity: u128) -> Result<(), MathError> {
        self.liquidity = self
            .liquidity
            .checked_sub(liquidity)
            .ok_or(MathError::Underflow)?;
        Ok(())
    }

    /// Moves the position to a new range. Only valid once all liquidity
    /// has been withdrawn.
    pub fn set_range(&mut self, lower_tick: i32, upper_tick: i32) -> VaultResult<()> {
        if self.liquidity != 0 {
            return Err(VaultError::InvalidRange {
                lower: lower_tick,
                upper: upper_tick,
            });
        }
        self.lower_tick = lower_tick;
        self.upper_tick = upper_tick;
        Ok(())
    }
}
