use super::full_math::to_u128;
use super::tick_math::{MAX_TICK, MIN_TICK};
use crate::error::MathError;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

const DISPLAY_SCALE: u32 = 18;

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfBounds(tick));
    }
    let price_f64 = 1.0001f64.powi(tick);
    Decimal::from_f64(price_f64).ok_or(MathError::Overflow)
}

/// Returns the tick nearest to a given price.
/// tick = log_1.0001(P)
pub fn price_to_tick(price: Decimal) -> Result<i32, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice);
    }
    let price_f64 = price.to_f64().ok_or(MathError::Overflow)?;
    let tick = price_f64.log(1.0001f64).round() as i32;
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfBounds(tick));
    }
    Ok(tick)
}

/// Token1-per-token0 price of a Q64.96 sqrt price, to 18 decimals.
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256) -> Result<Decimal, MathError> {
    let scale = U256::exp10(DISPLAY_SCALE as usize);
    let scaled = (sqrt_price_x96.full_mul(sqrt_price_x96) * U512::from(scale)) >> 192;
    let scaled = to_u128(U256::try_from(scaled).map_err(|_| MathError::Overflow)?)?;
    let mantissa = i128::try_from(scaled).map_err(|_| MathError::Overflow)?;
    Decimal::try_from_i128_with_scale(mantissa, DISPLAY_SCALE)
        .map(|price| price.normalize())
        .map_err(|_| MathError::Overflow)
}

/// Q64.96 sqrt price of a positive decimal price.
pub fn price_to_sqrt_price_x96(price: Decimal) -> Result<U256, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice);
    }
    let mantissa = u128::try_from(price.mantissa()).map_err(|_| MathError::Overflow)?;
    let denominator = 10u128
        .checked_pow(price.scale())
        .ok_or(MathError::Overflow)?;
    super::sqrt_price_math::encode_price_sqrt(mantissa, denominator)
}
