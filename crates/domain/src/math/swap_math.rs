use super::full_math::{Rounding, mul_div, mul_div_rounding_up};
use super::sqrt_price_math::{get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input};
use crate::error::MathError;
use crate::fees::FEE_PIPS_DENOMINATOR;
use primitive_types::U256;

/// Result of swapping within a single range of constant liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    pub sqrt_price_next: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// Exact-input swap step from `sqrt_price_current` towards `sqrt_price_target`.
///
/// `amount_remaining` includes the fee. The step stops at the target when the
/// input is enough to reach it; otherwise the whole input is consumed.
pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee_pips: u32,
) -> Result<SwapStep, MathError> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let fee = U256::from(fee_pips);
    let denominator = U256::from(FEE_PIPS_DENOMINATOR);

    let amount_remaining_less_fee = mul_div(amount_remaining, denominator - fee, denominator)?;

    let to_target = if zero_for_one {
        get_amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, Rounding::Up)?
    } else {
        get_amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, Rounding::Up)?
    };

    let sqrt_price_next = if amount_remaining_less_fee >= to_target {
        sqrt_price_target
    } else {
        get_next_sqrt_price_from_input(
            sqrt_price_current,
            liquidity,
            amount_remaining_less_fee,
            zero_for_one,
        )?
    };
    let reached_target = sqrt_price_next == sqrt_price_target;

    let (amount_in, amount_out) = if zero_for_one {
        (
            if reached_target {
                to_target
            } else {
                get_amount0_delta(sqrt_price_next, sqrt_price_current, liquidity, Rounding::Up)?
            },
            get_amount1_delta(sqrt_price_next, sqrt_price_current, liquidity, Rounding::Down)?,
        )
    } else {
        (
            if reached_target {
                to_target
            } else {
                get_amount1_delta(sqrt_price_current, sqrt_price_next, liquidity, Rounding::Up)?
            },
            get_amount0_delta(sqrt_price_current, sqrt_price_next, liquidity, Rounding::Down)?,
        )
    };

    // Whatever the price move did not consume is kept as fee.
    let fee_amount = if reached_target {
        mul_div_rounding_up(amount_in, fee, denominator - fee)?
    } else {
        amount_remaining
            .checked_sub(amount_in)
            .ok_or(MathError::Underflow)?
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}
