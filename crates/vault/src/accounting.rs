//! Share ↔ underlying conversion.
//!
//! Minting rounds required inputs up and burning rounds payouts down, so
//! existing holders never lose value to rounding.

use crate::error::{VaultError, VaultResult};
use crate::fees::FeeSplit;
use crate::params::AdminParams;
use crate::position::PositionLedger;
use clmm_vault_domain::math::full_math::{Rounding, mul_div_u128};
use clmm_vault_domain::math::liquidity_amounts::{fit_liquidity, get_amounts_for_liquidity};
use clmm_vault_domain::{MathError, U256};
use serde::{Deserialize, Serialize};

/// Inputs required for a mint and the shares they buy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintAmounts {
    pub amount0: u128,
    pub amount1: u128,
    pub shares: u128,
}

/// Shares and rounded-up inputs when the vault already has holders.
///
/// The side whose underlying total is zero is ignored; the share amount is
/// the smaller of what each maximum buys.
pub fn compute_mint_amounts(
    underlying0: u128,
    underlying1: u128,
    total_supply: u128,
    amount0_max: u128,
    amount1_max: u128,
) -> VaultResult<MintAmounts> {
    let shares = match (underlying0, underlying1) {
        (0, 0) => return Err(VaultError::InvalidShareAmount),
        (0, _) => mul_div_u128(amount1_max, total_supply, underlying1, Rounding::Down)?,
        (_, 0) => mul_div_u128(amount0_max, total_supply, underlying0, Rounding::Down)?,
        _ => {
            let shares0 = mul_div_u128(amount0_max, total_supply, underlying0, Rounding::Down)?;
            let shares1 = mul_div_u128(amount1_max, total_supply, underlying1, Rounding::Down)?;
            shares0.min(shares1)
        }
    };
    if shares == 0 {
        return Err(VaultError::InvalidShareAmount);
    }

    let (amount0, amount1) = amounts_for_shares(underlying0, underlying1, total_supply, shares)?;
    Ok(MintAmounts {
        amount0,
        amount1,
        shares,
    })
}

/// `ceil(shares * underlying / total_supply)` for each token.
pub fn amounts_for_shares(
    underlying0: u128,
    underlying1: u128,
    total_supply: u128,
    shares: u128,
) -> VaultResult<(u128, u128)> {
    if total_supply == 0 {
        return Err(MathError::DivisionByZero.into());
    }
    Ok((
        mul_div_u128(shares, underlying0, total_supply, Rounding::Up)?,
        mul_div_u128(shares, underlying1, total_supply, Rounding::Up)?,
    ))
}

/// First mint: shares are the liquidity units the maxima can back at the
/// live price, and the inputs are what that liquidity requires.
pub fn bootstrap_mint_amounts(
    sqrt_price_x96: U256,
    position: &PositionLedger,
    amount0_max: u128,
    amount1_max: u128,
) -> VaultResult<MintAmounts> {
    let (sqrt_lower, sqrt_upper) = position.sqrt_ratios()?;
    let fitted = fit_liquidity(
        sqrt_price_x96,
        sqrt_lower,
        sqrt_upper,
        amount0_max,
        amount1_max,
    )?;
    if fitted.liquidity == 0 {
        return Err(VaultError::InvalidShareAmount);
    }
    Ok(MintAmounts {
        amount0: fitted.amount0,
        amount1: fitted.amount1,
        shares: fitted.liquidity,
    })
}

/// Rounded-up inputs for `shares` of an empty vault.
pub fn bootstrap_amounts_for_shares(
    sqrt_price_x96: U256,
    position: &PositionLedger,
    shares: u128,
) -> VaultResult<(u128, u128)> {
    let (sqrt_lower, sqrt_upper) = position.sqrt_ratios()?;
    Ok(get_amounts_for_liquidity(
        sqrt_price_x96,
        sqrt_lower,
        sqrt_upper,
        shares,
        Rounding::Up,
    )?)
}

/// `floor(amount * shares / total_supply)`.
pub fn pro_rata(amount: u128, shares: u128, total_supply: u128) -> Result<u128, MathError> {
    mul_div_u128(amount, shares, total_supply, Rounding::Down)
}

/// Value held for depositors: deployed liquidity at the live price
/// (rounded down), uncollected fees net of the bucket cut, and idle
/// balances.
pub fn underlying_balances(
    sqrt_price_x96: U256,
    position: &PositionLedger,
    uncollected0: u128,
    uncollected1: u128,
    params: &AdminParams,
) -> Result<(u128, u128), MathError> {
    let (sqrt_lower, sqrt_upper) = position.sqrt_ratios()?;
    let (deployed0, deployed1) = get_amounts_for_liquidity(
        sqrt_price_x96,
        sqrt_lower,
        sqrt_upper,
        position.liquidity,
        Rounding::Down,
    )?;
    let split = FeeSplit::compute(
        uncollected0,
        uncollected1,
        params.manager_fee_bps,
        params.keeper_fee_bps,
    )?;

    let total0 = deployed0
        .checked_add(split.net0)
        .and_then(|v| v.checked_add(position.idle0))
        .ok_or(MathError::Overflow)?;
    let total1 = deployed1
        .checked_add(split.net1)
        .and_then(|v| v.checked_add(position.idle1))
        .ok_or(MathError::Overflow)?;
    Ok((total0, total1))
}
