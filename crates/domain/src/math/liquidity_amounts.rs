//! Liquidity ↔ token amount conversion for a single price range.

use super::full_math::{Rounding, mul_div, to_u128};
use super::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use super::tick_math::Q96;
use crate::error::MathError;
use primitive_types::U256;

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

/// Liquidity provided by `amount0` of token0 over `[sa, sb]`.
pub fn get_liquidity_for_amount0(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);
    if lower == upper {
        return Err(MathError::DivisionByZero);
    }
    let intermediate = mul_div(lower, upper, Q96)?;
    to_u128(mul_div(U256::from(amount0), intermediate, upper - lower)?)
}

/// Liquidity provided by `amount1` of token1 over `[sa, sb]`.
pub fn get_liquidity_for_amount1(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount1: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);
    if lower == upper {
        return Err(MathError::DivisionByZero);
    }
    to_u128(mul_div(U256::from(amount1), Q96, upper - lower)?)
}

/// Largest liquidity the two amounts can back at `sqrt_price` over `[sa, sb]`.
pub fn get_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: u128,
    amount1: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);

    if sqrt_price <= lower {
        get_liquidity_for_amount0(lower, upper, amount0)
    } else if sqrt_price < upper {
        let liquidity0 = get_liquidity_for_amount0(sqrt_price, upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(lower, upper, amount1)
    }
}

/// Token amounts backing `liquidity` at `sqrt_price` over `[sa, sb]`.
pub fn get_amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<(u128, u128), MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);

    let (amount0, amount1) = if sqrt_price <= lower {
        (
            get_amount0_delta(lower, upper, liquidity, rounding)?,
            U256::zero(),
        )
    } else if sqrt_price < upper {
        (
            get_amount0_delta(sqrt_price, upper, liquidity, rounding)?,
            get_amount1_delta(lower, sqrt_price, liquidity, rounding)?,
        )
    } else {
        (
            U256::zero(),
            get_amount1_delta(lower, upper, liquidity, rounding)?,
        )
    };

    Ok((to_u128(amount0)?, to_u128(amount1)?))
}

/// Liquidity that can be deposited from a fixed budget, with the amounts a
/// deposit of it will charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FittedLiquidity {
    pub liquidity: u128,
    pub amount0: u128,
    pub amount1: u128,
}

/// Largest liquidity whose rounded-up deposit amounts stay within
/// `available0` and `available1`.
pub fn fit_liquidity(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    available0: u128,
    available1: u128,
) -> Result<FittedLiquidity, MathError> {
    let mut liquidity =
        get_liquidity_for_amounts(sqrt_price, sqrt_ratio_a, sqrt_ratio_b, available0, available1)?;

    while liquidity > 0 {
        let (amount0, amount1) = get_amounts_for_liquidity(
            sqrt_price,
            sqrt_ratio_a,
            sqrt_ratio_b,
            liquidity,
            Rounding::Up,
        )?;
        if amount0 <= available0 && amount1 <= available1 {
            return Ok(FittedLiquidity {
                liquidity,
                amount0,
                amount1,
            });
        }
        liquidity -= 1;
    }

    Ok(FittedLiquidity::default())
}
