//! Shared fixtures for the vault integration tests.

#![allow(dead_code)]

use clmm_vault_core::prelude::*;
use clmm_vault_domain::amm::{ConcentratedPool, RangeOracle};
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::ledger::TokenLedger;
use clmm_vault_domain::{Address, U256};
use clmm_vault_simulation::prelude::*;

pub const T0: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;
pub const FUNDING: u128 = 1_000_000_000_000_000_000;

pub type TestVault = Vault<SimulatedPool, InMemoryTokenLedger>;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn manager() -> Address {
    addr(0x01)
}

pub fn keeper() -> Address {
    addr(0x02)
}

pub fn alice() -> Address {
    addr(0x0a)
}

pub fn bob() -> Address {
    addr(0x0b)
}

pub fn trader() -> Address {
    addr(0x0c)
}

pub fn outside_lp() -> Address {
    addr(0x0d)
}

pub fn treasury() -> Address {
    addr(0x0e)
}

/// Vault over a fresh pool at `sqrt_price_x96`, with depositors, a trader
/// and an outside LP funded. The outside LP adds `external_liquidity` over
/// the full range when it is non-zero.
pub fn setup_with(config: VaultConfig, sqrt_price_x96: U256, external_liquidity: u128) -> TestVault {
    let pair = config.pair().unwrap();
    let mut pool = SimulatedPool::new(addr(0x99), pair, FeeTier::MEDIUM, sqrt_price_x96).unwrap();
    let mut tokens = InMemoryTokenLedger::new();
    for holder in [alice(), bob(), trader(), outside_lp()] {
        tokens.mint(pair.token0, holder, FUNDING);
        tokens.mint(pair.token1, holder, FUNDING);
    }
    if external_liquidity > 0 {
        pool.add_liquidity(&mut tokens, outside_lp(), -887220, 887220, external_liquidity)
            .unwrap();
    }
    Vault::new(&config, pool, tokens, T0).unwrap()
}

pub fn live_price(vault: &TestVault) -> U256 {
    vault.pool().slot().unwrap().sqrt_price_x96
}

/// The vault's token balances are exactly its idle balances plus both fee
/// buckets.
pub fn assert_token_backing(vault: &TestVault) {
    let pair = vault.pair();
    let (idle0, idle1) = vault.idle_balances();
    let fees = vault.fee_buckets();
    assert_eq!(
        vault.tokens().balance_of(pair.token0, vault.address()),
        idle0 + fees.manager0 + fees.keeper0,
        "token0 backing"
    );
    assert_eq!(
        vault.tokens().balance_of(pair.token1, vault.address()),
        idle1 + fees.manager1 + fees.keeper1,
        "token1 backing"
    );
}

/// Mints what `max0`/`max1` buy for `who`.
pub fn mint_max(vault: &mut TestVault, who: Address, max0: u128, max1: u128, now: u64) -> MintReceipt {
    let quote = vault.get_mint_amounts(max0, max1, now).unwrap();
    let receipt = vault.mint(CallContext::new(who, now), quote.shares, who).unwrap();
    assert_eq!((receipt.amount0, receipt.amount1), (quote.amount0, quote.amount1));
    assert!(receipt.amount0 <= max0 && receipt.amount1 <= max1);
    receipt
}

pub fn trade(vault: &mut TestVault, amount0: u128, rounds: u32) {
    let (pool, tokens) = vault.collaborators_mut();
    wash_trade(pool, tokens, trader(), amount0, rounds).unwrap();
}

pub fn move_price(vault: &mut TestVault, target_sqrt_price_x96: U256) {
    let (pool, tokens) = vault.collaborators_mut();
    drive_to_price(pool, tokens, trader(), target_sqrt_price_x96).unwrap();
}
