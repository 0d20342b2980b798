//! Cadence and price gates of a rebalance, and the leftover swap plan.

use crate::error::{VaultError, VaultResult};
use clmm_vault_domain::bps::{BPS_DENOMINATOR, BasisPoints};
use clmm_vault_domain::math::sqrt_price_math::price_x192;
use clmm_vault_domain::math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use clmm_vault_domain::{U256, U512};
use serde::{Deserialize, Serialize};

/// Fails unless `heartbeat_seconds` have passed since `last_rebalance`.
pub fn check_heartbeat(now: u64, last_rebalance: u64, heartbeat_seconds: u64) -> VaultResult<()> {
    let elapsed = now.saturating_sub(last_rebalance);
    if elapsed < heartbeat_seconds {
        return Err(VaultError::RebalanceTooSoon {
            remaining: heartbeat_seconds - elapsed,
        });
    }
    Ok(())
}

/// Fails unless the live price is within `slippage` of the hinted price.
///
/// Compares prices, not sqrt prices: `|hint² - live²| * 10000 <= bps * live²`.
pub fn check_slippage(
    hint_sqrt_price_x96: U256,
    live_sqrt_price_x96: U256,
    slippage: BasisPoints,
) -> VaultResult<()> {
    let exceeded = VaultError::SlippageExceeded {
        slippage_bps: slippage.0,
    };
    // Hints outside the tick range cannot be squared safely.
    let valid = MIN_SQRT_RATIO..MAX_SQRT_RATIO;
    if !valid.contains(&hint_sqrt_price_x96) || !valid.contains(&live_sqrt_price_x96) {
        return Err(exceeded);
    }
    let hint = price_x192(hint_sqrt_price_x96);
    let live = price_x192(live_sqrt_price_x96);
    let deviation = if hint > live { hint - live } else { live - hint };

    let lhs = deviation * U512::from(BPS_DENOMINATOR);
    let rhs = live * U512::from(slippage.0);
    if lhs > rhs {
        return Err(exceeded);
    }
    Ok(())
}

/// Sqrt price limit of the leftover swap: `slippage` beyond the less
/// favourable of hint and live price, clamped inside the valid range.
///
/// The band is halved on the sqrt price so that the price itself moves by
/// about `slippage`, the same measure [`check_slippage`] uses.
pub fn swap_price_limit(
    hint_sqrt_price_x96: U256,
    live_sqrt_price_x96: U256,
    zero_for_one: bool,
    slippage: BasisPoints,
) -> U256 {
    let denominator = U256::from(2 * u32::from(BPS_DENOMINATOR));
    let band = U256::from(slippage.0.min(BPS_DENOMINATOR));
    if zero_for_one {
        let base = hint_sqrt_price_x96.min(live_sqrt_price_x96);
        let limit = base * (denominator - band) / denominator;
        limit.max(MIN_SQRT_RATIO + U256::one())
    } else {
        let base = hint_sqrt_price_x96
            .max(live_sqrt_price_x96)
            .min(MAX_SQRT_RATIO);
        let limit = base * (denominator + band) / denominator;
        limit.min(MAX_SQRT_RATIO - U256::one())
    }
}

/// Direction and size of the swap that rebalances idle leftovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPlan {
    pub zero_for_one: bool,
    pub amount_in: u128,
}

/// Swaps `swap_bps` of whichever idle token is worth more at the live
/// price. Returns `None` when there is nothing to swap.
pub fn plan_leftover_swap(
    idle0: u128,
    idle1: u128,
    live_sqrt_price_x96: U256,
    swap_bps: BasisPoints,
) -> VaultResult<Option<SwapPlan>> {
    if swap_bps.is_zero() {
        return Ok(None);
    }
    // idle0 valued in token1: idle0 * sqrt^2 / 2^192.
    let value0 = (U512::from(idle0) * price_x192(live_sqrt_price_x96)) >> 192;
    let zero_for_one = value0 > U512::from(idle1);
    let leftover = if zero_for_one { idle0 } else { idle1 };

    let amount_in = swap_bps.apply(leftover)?;
    if amount_in == 0 {
        return Ok(None);
    }
    Ok(Some(SwapPlan {
        zero_for_one,
        amount_in,
    }))
}
