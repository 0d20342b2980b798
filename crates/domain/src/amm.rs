//! Interface of the concentrated-liquidity AMM the vault deploys into.
//!
//! The vault only ever holds a single range position, keyed by
//! `(owner, lower_tick, upper_tick)`. Every call is synchronous and either
//! completes or returns an [`AmmError`] without partial effects.

use crate::error::MathError;
use crate::ledger::TokenLedger;
use crate::token::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("invalid tick range [{lower}, {upper}]")]
    InvalidRange { lower: i32, upper: i32 },

    #[error("no position for owner at [{lower}, {upper}]")]
    PositionNotFound { lower: i32, upper: i32 },

    #[error("position holds {available} liquidity, {requested} requested")]
    InsufficientLiquidity { requested: u128, available: u128 },

    #[error("invalid sqrt price limit {0}")]
    InvalidPriceLimit(String),

    #[error("zero amount")]
    ZeroAmount,

    #[error("pool charged ({charged0}, {charged1}) against ({offered0}, {offered1}) offered")]
    Overcharged {
        offered0: u128,
        offered1: u128,
        charged0: u128,
        charged1: u128,
    },

    #[error("swap consumed {used} input, {requested} requested")]
    SwapInputExceeded { requested: u128, used: u128 },

    #[error("token settlement failed: {0}")]
    Settlement(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Current price state of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSlot {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// Liquidity and uncollected fees of one range position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub liquidity: u128,
    pub fees0: u128,
    pub fees1: u128,
}

/// Amounts returned when liquidity is removed. Principal and fees are
/// reported separately; all accrued fees of the position are collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedLiquidity {
    pub owed0: u128,
    pub owed1: u128,
    pub fees0: u128,
    pub fees1: u128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub amount_in: u128,
    pub amount_out: u128,
}

/// Read-only view of the AMM.
pub trait RangeOracle {
    fn slot(&self) -> Result<PoolSlot, AmmError>;

    fn tick_spacing(&self) -> i32;

    fn position(&self, owner: Address, lower: i32, upper: i32)
    -> Result<PositionSnapshot, AmmError>;
}

/// Mutating AMM operations. Tokens move between `owner`/`recipient` and the
/// pool through the token ledger passed to each call.
pub trait ConcentratedPool: RangeOracle {
    /// Deposits `liquidity` into the range and returns the token amounts
    /// charged, rounded up.
    fn add_liquidity(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: Address,
        lower: i32,
        upper: i32,
        liquidity: u128,
    ) -> Result<(u128, u128), AmmError>;

    /// Withdraws `liquidity` from the range, collecting all accrued fees of
    /// the position along with the principal.
    fn remove_liquidity(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: Address,
        lower: i32,
        upper: i32,
        liquidity: u128,
    ) -> Result<RemovedLiquidity, AmmError>;

    /// Exact-input swap bounded by `sqrt_price_limit_x96`.
    fn swap(
        &mut self,
        ledger: &mut dyn TokenLedger,
        recipient: Address,
        zero_for_one: bool,
        amount_in: u128,
        sqrt_price_limit_x96: U256,
    ) -> Result<SwapOutcome, AmmError>;
}
