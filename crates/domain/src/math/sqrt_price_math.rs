//! Token deltas between sqrt prices and price movement for a given input.

use super::full_math::{Rounding, div_rounding_up, mul_div, mul_div_rounded, mul_div_rounding_up};
use super::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO, Q96};
use crate::error::MathError;
use primitive_types::{U256, U512};

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

fn narrow(value: U512) -> Result<U256, MathError> {
    U256::try_from(value).map_err(|_| MathError::Overflow)
}

/// Amount of token0 between two sqrt prices for `liquidity`.
///
/// `L * (sb - sa) / (sa * sb)` scaled by 2^96.
pub fn get_amount0_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);
    if lower.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;

    match rounding {
        Rounding::Up => div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower),
        Rounding::Down => Ok(mul_div(numerator1, numerator2, upper)? / lower),
    }
}

/// Amount of token1 between two sqrt prices for `liquidity`: `L * (sb - sa)`.
pub fn get_amount1_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);
    mul_div_rounded(U256::from(liquidity), upper - lower, Q96, rounding)
}

/// Price after adding `amount` of token0, rounded up so the price never
/// moves further than the input pays for.
fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256, MathError> {
    if amount.is_zero() {
        return Ok(sqrt_price);
    }
    let numerator1 = U512::from(U256::from(liquidity) << 96);
    let denominator = numerator1 + amount.full_mul(sqrt_price);
    let product = numerator1 * U512::from(sqrt_price);

    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        narrow(quotient)
    } else {
        narrow(quotient + U512::one())
    }
}

/// Price after adding `amount` of token1, rounded down.
fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256, MathError> {
    let quotient = U512::from(amount) * U512::from(Q96) / U512::from(liquidity);
    narrow(U512::from(sqrt_price) + quotient)
}

/// Sqrt price reached after swapping `amount_in` into a range of constant
/// `liquidity`.
pub fn get_next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, MathError> {
    if sqrt_price.is_zero() || liquidity == 0 {
        return Err(MathError::DivisionByZero);
    }
    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price, liquidity, amount_in)
    } else {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price, liquidity, amount_in)
    }
}

/// Encodes `reserve1 / reserve0` as a Q64.96 sqrt price.
pub fn encode_price_sqrt(reserve1: u128, reserve0: u128) -> Result<U256, MathError> {
    if reserve0 == 0 {
        return Err(MathError::DivisionByZero);
    }
    if reserve1 == 0 {
        return Err(MathError::NonPositivePrice);
    }
    let ratio_x192 = (U512::from(reserve1) << 192) / U512::from(reserve0);
    let sqrt = narrow(ratio_x192.integer_sqrt())?;
    if sqrt < MIN_SQRT_RATIO || sqrt >= MAX_SQRT_RATIO {
        return Err(MathError::SqrtPriceOutOfBounds(sqrt.to_string()));
    }
    Ok(sqrt)
}

/// `sqrt_price^2`, the Q128.192 price, kept in 512 bits.
pub fn price_x192(sqrt_price: U256) -> U512 {
    sqrt_price.full_mul(sqrt_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::get_sqrt_ratio_at_tick;

    #[test]
    fn test_deltas_between_one_and_four() {
        // sqrt prices 1 and 2: dy = L, dx = L / 2.
        let sa = Q96;
        let sb = Q96 * U256::from(2u64);

        assert_eq!(
            get_amount1_delta(sa, sb, 1000, Rounding::Down).unwrap(),
            U256::from(1000u64)
        );
        assert_eq!(
            get_amount0_delta(sa, sb, 1000, Rounding::Down).unwrap(),
            U256::from(500u64)
        );
        // Argument order does not matter.
        assert_eq!(
            get_amount0_delta(sb, sa, 1000, Rounding::Up).unwrap(),
            U256::from(500u64)
        );
    }

    #[test]
    fn test_rounding_direction() {
        let sa = get_sqrt_ratio_at_tick(-60).unwrap();
        let sb = get_sqrt_ratio_at_tick(60).unwrap();
        let down = get_amount0_delta(sa, sb, 1_000_003, Rounding::Down).unwrap();
        let up = get_amount0_delta(sa, sb, 1_000_003, Rounding::Up).unwrap();
        assert_eq!(up, down + U256::one());

        let down = get_amount1_delta(sa, sb, 1_000_003, Rounding::Down).unwrap();
        let up = get_amount1_delta(sa, sb, 1_000_003, Rounding::Up).unwrap();
        assert_eq!(up, down + U256::one());
    }

    #[test]
    fn test_next_price_direction() {
        let liquidity = 1_000_000_000_000u128;
        let next = get_next_sqrt_price_from_input(Q96, liquidity, U256::from(1_000_000u64), true)
            .unwrap();
        assert!(next < Q96);

        let next = get_next_sqrt_price_from_input(Q96, liquidity, U256::from(1_000_000u64), false)
            .unwrap();
        assert!(next > Q96);

        assert_eq!(
            get_next_sqrt_price_from_input(Q96, liquidity, U256::zero(), true).unwrap(),
            Q96
        );
        assert!(get_next_sqrt_price_from_input(Q96, 0, U256::one(), true).is_err());
    }

    #[test]
    fn test_encode_price_sqrt() {
        assert_eq!(encode_price_sqrt(1, 1).unwrap(), Q96);
        assert_eq!(encode_price_sqrt(4, 1).unwrap(), Q96 * U256::from(2u64));
        assert_eq!(encode_price_sqrt(1, 4).unwrap(), Q96 / U256::from(2u64));
        assert_eq!(encode_price_sqrt(1, 0), Err(MathError::DivisionByZero));
        assert_eq!(encode_price_sqrt(0, 1), Err(MathError::NonPositivePrice));
    }
}
