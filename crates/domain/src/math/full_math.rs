//! Full-precision multiply-then-divide.
//!
//! Products are widened to `U512` so `a * b / d` never overflows in the
//! intermediate step; only a final result that does not fit is an error.

use crate::error::MathError;
use primitive_types::{U256, U512};

/// Rounding direction for precision control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

fn narrow(value: U512) -> Result<U256, MathError> {
    U256::try_from(value).map_err(|_| MathError::Overflow)
}

/// `floor(a * b / denominator)`.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.full_mul(b);
    narrow(product / U512::from(denominator))
}

/// `ceil(a * b / denominator)`.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.full_mul(b);
    let denominator = U512::from(denominator);
    let quotient = product / denominator;
    let result = if (product % denominator).is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    narrow(result)
}

/// `a * b / denominator` with the requested rounding.
pub fn mul_div_rounded(
    a: U256,
    b: U256,
    denominator: U256,
    rounding: Rounding,
) -> Result<U256, MathError> {
    match rounding {
        Rounding::Down => mul_div(a, b, denominator),
        Rounding::Up => mul_div_rounding_up(a, b, denominator),
    }
}

/// `ceil(numerator / denominator)`.
pub fn div_rounding_up(numerator: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

/// Converts to `u128`, failing instead of truncating.
pub fn to_u128(value: U256) -> Result<u128, MathError> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(value.low_u128())
}

/// `a * b / denominator` on `u128` operands, widened to 256 bits.
pub fn mul_div_u128(
    a: u128,
    b: u128,
    denominator: u128,
    rounding: Rounding,
) -> Result<u128, MathError> {
    let result = mul_div_rounded(
        U256::from(a),
        U256::from(b),
        U256::from(denominator),
        rounding,
    )?;
    to_u128(result)
}
