//! In-memory concentrated-liquidity pool.
//!
//! Positions are keyed by `(owner, lower_tick, upper_tick)`. Swaps are exact
//! input and walk across position boundaries one constant-liquidity segment
//! at a time; swap fees are attributed to the positions active in each
//! segment in proportion to their liquidity.

use clmm_vault_domain::amm::{
    AmmError, ConcentratedPool, PoolSlot, PositionSnapshot, RangeOracle, RemovedLiquidity,
    SwapOutcome,
};
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::ledger::{TokenLedger, Transactional};
use clmm_vault_domain::math::full_math::{Rounding, mul_div_u128, to_u128};
use clmm_vault_domain::math::liquidity_amounts::get_amounts_for_liquidity;
use clmm_vault_domain::math::price_tick::price_to_sqrt_price_x96;
use clmm_vault_domain::math::swap_math::compute_swap_step;
use clmm_vault_domain::math::tick_math::{
    get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, is_usable_tick,
};
use clmm_vault_domain::math::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use clmm_vault_domain::{Address, MathError, TokenPair, U256};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::trace;

/// Upper bound on segments walked by one swap.
const MAX_SWAP_STEPS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PositionKey {
    owner: Address,
    lower: i32,
    upper: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PositionState {
    liquidity: u128,
    fees0: u128,
    fees1: u128,
}

/// Single-pair pool holding its reserves under `address` in the token ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedPool {
    address: Address,
    pair: TokenPair,
    fee_tier: FeeTier,
    sqrt_price_x96: U256,
    tick: i32,
    positions: BTreeMap<PositionKey, PositionState>,
}

impl SimulatedPool {
    /// Creates a pool at `sqrt_price_x96`.
    pub fn new(
        address: Address,
        pair: TokenPair,
        fee_tier: FeeTier,
        sqrt_price_x96: U256,
    ) -> Result<Self, AmmError> {
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        Ok(Self {
            address,
            pair,
            fee_tier,
            sqrt_price_x96,
            tick,
            positions: BTreeMap::new(),
        })
    }

    /// Creates a pool at a token1-per-token0 decimal price.
    pub fn with_price(
        address: Address,
        pair: TokenPair,
        fee_tier: FeeTier,
        price: Decimal,
    ) -> Result<Self, AmmError> {
        Self::new(address, pair, fee_tier, price_to_sqrt_price_x96(price)?)
    }

    /// Address the pool holds its reserves under.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Token pair traded by the pool.
    pub fn pair(&self) -> TokenPair {
        self.pair
    }

    /// Swap fee and tick spacing.
    pub fn fee_tier(&self) -> FeeTier {
        self.fee_tier
    }

    /// Current sqrt price, Q64.96.
    pub fn sqrt_price_x96(&self) -> U256 {
        self.sqrt_price_x96
    }

    /// Current tick.
    pub fn current_tick(&self) -> i32 {
        self.tick
    }

    /// Liquidity of positions covering the current price.
    pub fn active_liquidity(&self) -> Result<u128, AmmError> {
        let mut total = 0u128;
        for (key, state) in &self.positions {
            if key.lower <= self.tick && self.tick < key.upper {
                total = total
                    .checked_add(state.liquidity)
                    .ok_or(MathError::Overflow)?;
            }
        }
        Ok(total)
    }

    /// Number of open positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    fn validate_range(&self, lower: i32, upper: i32) -> Result<(), AmmError> {
        let spacing = self.fee_tier.tick_spacing;
        if lower >= upper
            || lower < MIN_TICK
            || upper > MAX_TICK
            || !is_usable_tick(lower, spacing)
            || !is_usable_tick(upper, spacing)
        {
            return Err(AmmError::InvalidRange { lower, upper });
        }
        Ok(())
    }

    fn range_ratios(lower: i32, upper: i32) -> Result<(U256, U256), AmmError> {
        Ok((
            get_sqrt_ratio_at_tick(lower)?,
            get_sqrt_ratio_at_tick(upper)?,
        ))
    }

    fn settle(
        ledger: &mut dyn TokenLedger,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), AmmError> {
        if amount == 0 {
            return Ok(());
        }
        ledger
            .transfer(token, from, to, amount)
            .map_err(|e| AmmError::Settlement(e.to_string()))
    }

    /// Liquidity in the segment the price moves into, and the keys of the
    /// positions providing it. A position is in the segment below the price
    /// when `lower < p <= upper` and above it when `lower <= p < upper`.
    fn segment(
        &self,
        sqrt_price: U256,
        zero_for_one: bool,
    ) -> Result<(u128, Vec<(PositionKey, u128)>), AmmError> {
        let mut total = 0u128;
        let mut members = Vec::new();
        for (key, state) in &self.positions {
            if state.liquidity == 0 {
                continue;
            }
            let (sqrt_lower, sqrt_upper) = Self::range_ratios(key.lower, key.upper)?;
            let active = if zero_for_one {
                sqrt_lower < sqrt_price && sqrt_price <= sqrt_upper
            } else {
                sqrt_lower <= sqrt_price && sqrt_price < sqrt_upper
            };
            if active {
                total = total
                    .checked_add(state.liquidity)
                    .ok_or(MathError::Overflow)?;
                members.push((*key, state.liquidity));
            }
        }
        Ok((total, members))
    }

    /// Nearest position boundary strictly beyond the price in the swap
    /// direction.
    fn next_boundary(&self, sqrt_price: U256, zero_for_one: bool) -> Result<Option<U256>, AmmError> {
        let mut best: Option<U256> = None;
        for key in self.positions.keys() {
            for tick in [key.lower, key.upper] {
                let ratio = get_sqrt_ratio_at_tick(tick)?;
                let beyond = if zero_for_one {
                    ratio < sqrt_price
                } else {
                    ratio > sqrt_price
                };
                if beyond {
                    best = Some(match best {
                        Some(current) if zero_for_one => current.max(ratio),
                        Some(current) => current.min(ratio),
                        None => ratio,
                    });
                }
            }
        }
        Ok(best)
    }

    fn attribute_fees(
        &mut self,
        fee: u128,
        zero_for_one: bool,
        total: u128,
        members: &[(PositionKey, u128)],
    ) -> Result<(), AmmError> {
        if fee == 0 || total == 0 {
            return Ok(());
        }
        for (key, liquidity) in members {
            let share = mul_div_u128(fee, *liquidity, total, Rounding::Down)?;
            if let Some(state) = self.positions.get_mut(key) {
                let bucket = if zero_for_one {
                    &mut state.fees0
                } else {
                    &mut state.fees1
                };
                *bucket = bucket.checked_add(share).ok_or(MathError::Overflow)?;
            }
        }
        Ok(())
    }
}

impl RangeOracle for SimulatedPool {
    fn slot(&self) -> Result<PoolSlot, AmmError> {
        Ok(PoolSlot {
            sqrt_price_x96: self.sqrt_price_x96,
            tick: self.tick,
        })
    }

    fn tick_spacing(&self) -> i32 {
        self.fee_tier.tick_spacing
    }

    fn position(
        &self,
        owner: Address,
        lower: i32,
        upper: i32,
    ) -> Result<PositionSnapshot, AmmError> {
        let state = self
            .positions
            .get(&PositionKey {
                owner,
                lower,
                upper,
            })
            .copied()
            .unwrap_or_default();
        Ok(PositionSnapshot {
            liquidity: state.liquidity,
            fees0: state.fees0,
            fees1: state.fees1,
        })
    }
}

impl ConcentratedPool for SimulatedPool {
    fn add_liquidity(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: Address,
        lower: i32,
        upper: i32,
        liquidity: u128,
    ) -> Result<(u128, u128), AmmError> {
        self.validate_range(lower, upper)?;
        if liquidity == 0 {
            return Err(AmmError::ZeroAmount);
        }
        let (sqrt_lower, sqrt_upper) = Self::range_ratios(lower, upper)?;
        let (amount0, amount1) = get_amounts_for_liquidity(
            self.sqrt_price_x96,
            sqrt_lower,
            sqrt_upper,
            liquidity,
            Rounding::Up,
        )?;

        Self::settle(ledger, self.pair.token0, owner, self.address, amount0)?;
        Self::settle(ledger, self.pair.token1, owner, self.address, amount1)?;

        let state = self
            .positions
            .entry(PositionKey {
                owner,
                lower,
                upper,
            })
            .or_default();
        state.liquidity = state
            .liquidity
            .checked_add(liquidity)
            .ok_or(MathError::Overflow)?;

        trace!(owner = ?owner, lower, upper, liquidity, amount0, amount1, "Liquidity added");
        Ok((amount0, amount1))
    }

    fn remove_liquidity(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: Address,
        lower: i32,
        upper: i32,
        liquidity: u128,
    ) -> Result<RemovedLiquidity, AmmError> {
        let key = PositionKey {
            owner,
            lower,
            upper,
        };
        let state = self
            .positions
            .get(&key)
            .copied()
            .ok_or(AmmError::PositionNotFound { lower, upper })?;
        if liquidity > state.liquidity {
            return Err(AmmError::InsufficientLiquidity {
                requested: liquidity,
                available: state.liquidity,
            });
        }

        let (sqrt_lower, sqrt_upper) = Self::range_ratios(lower, upper)?;
        let (owed0, owed1) = get_amounts_for_liquidity(
            self.sqrt_price_x96,
            sqrt_lower,
            sqrt_upper,
            liquidity,
            Rounding::Down,
        )?;
        let removed = RemovedLiquidity {
            owed0,
            owed1,
            fees0: state.fees0,
            fees1: state.fees1,
        };

        let pay0 = owed0.checked_add(state.fees0).ok_or(MathError::Overflow)?;
        let pay1 = owed1.checked_add(state.fees1).ok_or(MathError::Overflow)?;
        Self::settle(ledger, self.pair.token0, self.address, owner, pay0)?;
        Self::settle(ledger, self.pair.token1, self.address, owner, pay1)?;

        let remaining = state.liquidity - liquidity;
        if remaining == 0 {
            self.positions.remove(&key);
        } else {
            self.positions.insert(
                key,
                PositionState {
                    liquidity: remaining,
                    fees0: 0,
                    fees1: 0,
                },
            );
        }

        trace!(owner = ?owner, lower, upper, liquidity, owed0, owed1, "Liquidity removed");
        Ok(removed)
    }

    fn swap(
        &mut self,
        ledger: &mut dyn TokenLedger,
        recipient: Address,
        zero_for_one: bool,
        amount_in: u128,
        sqrt_price_limit_x96: U256,
    ) -> Result<SwapOutcome, AmmError> {
        if amount_in == 0 {
            return Err(AmmError::ZeroAmount);
        }
        let limit_ok = if zero_for_one {
            sqrt_price_limit_x96 <= self.sqrt_price_x96 && sqrt_price_limit_x96 > MIN_SQRT_RATIO
        } else {
            sqrt_price_limit_x96 >= self.sqrt_price_x96 && sqrt_price_limit_x96 < MAX_SQRT_RATIO
        };
        if !limit_ok {
            return Err(AmmError::InvalidPriceLimit(sqrt_price_limit_x96.to_string()));
        }

        let mut remaining = U256::from(amount_in);
        let mut amount_out = U256::zero();
        let mut sqrt_price = self.sqrt_price_x96;

        for _ in 0..MAX_SWAP_STEPS {
            if remaining.is_zero() || sqrt_price == sqrt_price_limit_x96 {
                break;
            }
            let target = match self.next_boundary(sqrt_price, zero_for_one)? {
                Some(boundary) if zero_for_one => boundary.max(sqrt_price_limit_x96),
                Some(boundary) => boundary.min(sqrt_price_limit_x96),
                None => sqrt_price_limit_x96,
            };
            let (liquidity, members) = self.segment(sqrt_price, zero_for_one)?;
            if liquidity == 0 {
                // Empty segment: the price jumps to the next boundary for free.
                sqrt_price = target;
                continue;
            }

            let step = compute_swap_step(sqrt_price, target, liquidity, remaining, self.fee_tier.fee_pips)?;
            let consumed = step
                .amount_in
                .checked_add(step.fee_amount)
                .ok_or(MathError::Overflow)?;
            remaining = remaining.checked_sub(consumed).ok_or(MathError::Underflow)?;
            amount_out = amount_out
                .checked_add(step.amount_out)
                .ok_or(MathError::Overflow)?;
            self.attribute_fees(to_u128(step.fee_amount)?, zero_for_one, liquidity, &members)?;

            let moved = step.sqrt_price_next != sqrt_price;
            sqrt_price = step.sqrt_price_next;
            if !moved && consumed.is_zero() {
                break;
            }
        }

        let used = to_u128(U256::from(amount_in) - remaining)?;
        let amount_out = to_u128(amount_out)?;
        self.sqrt_price_x96 = sqrt_price;
        self.tick = get_tick_at_sqrt_ratio(sqrt_price)?;

        let (token_in, token_out) = if zero_for_one {
            (self.pair.token0, self.pair.token1)
        } else {
            (self.pair.token1, self.pair.token0)
        };
        Self::settle(ledger, token_in, recipient, self.address, used)?;
        Self::settle(ledger, token_out, self.address, recipient, amount_out)?;

        trace!(
            zero_for_one,
            amount_in = used,
            amount_out,
            tick = self.tick,
            "Swap executed"
        );
        Ok(SwapOutcome {
            amount_in: used,
            amount_out,
        })
    }
}

impl Transactional for SimulatedPool {
    type Snapshot = SimulatedPool;

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}
