//! Market activity around the pool: fee-generating round trips and price
//! moves.

use crate::pool::SimulatedPool;
use clmm_vault_domain::amm::{AmmError, ConcentratedPool, SwapOutcome};
use clmm_vault_domain::ledger::TokenLedger;
use clmm_vault_domain::math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use clmm_vault_domain::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Volume generated by [`wash_trade`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashTradeReport {
    /// Completed round trips.
    pub rounds: u32,
    /// Token0 paid into the pool, fees included.
    pub volume0: u128,
    /// Token1 paid into the pool, fees included.
    pub volume1: u128,
}

/// Swaps `amount0` of token0 into the pool and the proceeds straight back,
/// `rounds` times. The price ends close to where it started and every
/// active position earns fees on both legs.
pub fn wash_trade(
    pool: &mut SimulatedPool,
    ledger: &mut dyn TokenLedger,
    trader: Address,
    amount0: u128,
    rounds: u32,
) -> Result<WashTradeReport, AmmError> {
    let mut report = WashTradeReport::default();
    if amount0 == 0 {
        return Ok(report);
    }
    for _ in 0..rounds {
        let out = pool.swap(ledger, trader, true, amount0, MIN_SQRT_RATIO + U256::one())?;
        report.volume0 = report.volume0.saturating_add(out.amount_in);
        if out.amount_out > 0 {
            let back = pool.swap(
                ledger,
                trader,
                false,
                out.amount_out,
                MAX_SQRT_RATIO - U256::one(),
            )?;
            report.volume1 = report.volume1.saturating_add(back.amount_in);
        }
        report.rounds += 1;
    }
    debug!(
        rounds = report.rounds,
        volume0 = report.volume0,
        volume1 = report.volume1,
        "Wash trading done"
    );
    Ok(report)
}

/// Swaps with the trader's whole balance of the input token until the pool
/// reaches `target_sqrt_price_x96`, or the balance runs out.
///
/// Returns `None` when the pool is already at the target.
pub fn drive_to_price(
    pool: &mut SimulatedPool,
    ledger: &mut dyn TokenLedger,
    trader: Address,
    target_sqrt_price_x96: U256,
) -> Result<Option<SwapOutcome>, AmmError> {
    let target = target_sqrt_price_x96
        .max(MIN_SQRT_RATIO + U256::one())
        .min(MAX_SQRT_RATIO - U256::one());
    let current = pool.sqrt_price_x96();
    if target == current {
        return Ok(None);
    }

    let zero_for_one = target < current;
    let pair = pool.pair();
    let token_in = if zero_for_one { pair.token0 } else { pair.token1 };
    let budget = ledger.balance_of(token_in, trader);
    if budget == 0 {
        return Err(AmmError::Settlement(format!(
            "trader {trader:?} holds no {token_in:?}"
        )));
    }

    let outcome = pool.swap(ledger, trader, zero_for_one, budget, target)?;
    debug!(
        zero_for_one,
        amount_in = outcome.amount_in,
        amount_out = outcome.amount_out,
        tick = pool.current_tick(),
        "Price driven"
    );
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryTokenLedger;
    use clmm_vault_domain::amm::RangeOracle;
    use clmm_vault_domain::fees::FeeTier;
    use clmm_vault_domain::math::Q96;
    use clmm_vault_domain::math::tick_math::get_sqrt_ratio_at_tick;
    use clmm_vault_domain::TokenPair;

    fn setup() -> (SimulatedPool, InMemoryTokenLedger, Address, Address) {
        let pair = TokenPair::sorted(Address::from_low_u64_be(0xa0), Address::from_low_u64_be(0xb0))
            .unwrap();
        let mut pool =
            SimulatedPool::new(Address::from_low_u64_be(0x99), pair, FeeTier::MEDIUM, Q96).unwrap();
        let mut ledger = InMemoryTokenLedger::new();
        let lp = Address::from_low_u64_be(0x11);
        let trader = Address::from_low_u64_be(0x22);
        for holder in [lp, trader] {
            ledger.mint(pair.token0, holder, 10_000_000_000);
            ledger.mint(pair.token1, holder, 10_000_000_000);
        }
        pool.add_liquidity(&mut ledger, lp, -887220, 887220, 1_000_000_000)
            .unwrap();
        (pool, ledger, lp, trader)
    }

    #[test]
    fn test_wash_trade_generates_fees_on_both_tokens() {
        let (mut pool, mut ledger, lp, trader) = setup();
        let report = wash_trade(&mut pool, &mut ledger, trader, 1_000_000, 3).unwrap();
        assert_eq!(report.rounds, 3);
        assert_eq!(report.volume0, 3_000_000);
        assert!(report.volume1 > 0);

        let fees = pool.position(lp, -887220, 887220).unwrap();
        assert!(fees.fees0 >= 9_000);
        assert!(fees.fees1 > 0);
    }

    #[test]
    fn test_drive_to_price_both_directions() {
        let (mut pool, mut ledger, _, trader) = setup();

        let up = get_sqrt_ratio_at_tick(1_200).unwrap();
        let outcome = drive_to_price(&mut pool, &mut ledger, trader, up)
            .unwrap()
            .unwrap();
        assert!(outcome.amount_in > 0);
        assert_eq!(pool.sqrt_price_x96(), up);
        assert_eq!(pool.current_tick(), 1_200);

        let down = get_sqrt_ratio_at_tick(-600).unwrap();
        drive_to_price(&mut pool, &mut ledger, trader, down).unwrap();
        assert_eq!(pool.current_tick(), -600);

        assert_eq!(drive_to_price(&mut pool, &mut ledger, trader, down).unwrap(), None);
    }
}
