mod common;

use clmm_vault_core::prelude::*;
use clmm_vault_domain::amm::RangeOracle;
use clmm_vault_domain::bps::BasisPoints;
use clmm_vault_domain::ledger::TokenLedger;
use clmm_vault_domain::math::Q96;
use clmm_vault_domain::math::tick_math::get_sqrt_ratio_at_tick;
use common::*;

fn fee_params() -> AdminParams {
    AdminParams::default()
        .with_fees(BasisPoints(1_000), BasisPoints(500))
        .with_treasury(treasury())
}

#[test]
fn test_two_depositors_through_rebalances() {
    let config = VaultConfig::default()
        .with_range(-1_200, 1_200)
        .with_params(fee_params());
    let mut vault = setup_with(config, Q96, 1_000_000_000_000);

    let first = mint_max(&mut vault, alice(), 1_000_000_000, 1_000_000_000, T0);
    assert_eq!(vault.total_supply(), first.shares);
    assert_eq!(vault.liquidity(), first.liquidity_added);
    let second = mint_max(&mut vault, bob(), 500_000_000, 500_000_000, T0 + 1);
    assert!(second.shares.abs_diff(first.shares / 2) <= first.shares / 1_000);
    assert_token_backing(&vault);

    trade(&mut vault, 10_000_000, 5);
    let keeper_ctx = CallContext::new(keeper(), T0 + DAY);
    let report = vault
        .rebalance(keeper_ctx, live_price(&vault), BasisPoints(5_000), 0, vault.pair().token1)
        .unwrap();
    assert!(report.harvest.is_some());
    assert_token_backing(&vault);

    // Price leaves the range; the manager recenters around it.
    move_price(&mut vault, get_sqrt_ratio_at_tick(1_800).unwrap());
    let slot = vault.pool().slot().unwrap();
    assert!(slot.tick > vault.upper_tick());
    let (underlying0, underlying1) = vault.get_underlying_balances(T0 + DAY).unwrap();
    // Above the range the position holds token1 only.
    assert!(underlying0 >= vault.idle_balances().0);
    assert!(underlying1 > vault.idle_balances().1);

    let report = vault
        .executive_rebalance(
            CallContext::new(manager(), T0 + DAY + 60),
            600,
            3_000,
            slot.sqrt_price_x96,
            BasisPoints(5_000),
        )
        .unwrap();
    assert!(report.swap.is_some());
    assert_eq!((vault.lower_tick(), vault.upper_tick()), (600, 3_000));
    assert_token_backing(&vault);

    trade(&mut vault, 10_000_000, 5);
    let keeper_ctx = CallContext::new(keeper(), T0 + 2 * DAY);
    vault
        .rebalance(keeper_ctx, live_price(&vault), BasisPoints::ZERO, 0, vault.pair().token0)
        .unwrap();
    assert_token_backing(&vault);

    let summary = vault.events().summary();
    assert_eq!(summary.mints, 2);
    assert_eq!(summary.rebalances, 2);
    assert_eq!(summary.executive_rebalances, 1);
    assert!(summary.harvests >= 2);
    assert_eq!(summary.fees_harvested0, vault.fee_buckets().harvested0);
}

#[test]
fn test_everyone_exits_and_nothing_is_stuck() {
    let mut vault = setup_with(VaultConfig::default().with_params(fee_params()), Q96, 0);
    let a = mint_max(&mut vault, alice(), 2_000_000_000, 2_000_000_000, T0);
    let b = mint_max(&mut vault, bob(), 1_000_000_000, 1_000_000_000, T0);
    trade(&mut vault, 5_000_000, 4);

    vault.burn(CallContext::new(alice(), T0 + 10), a.shares, alice()).unwrap();
    vault.burn(CallContext::new(bob(), T0 + 10), b.shares, bob()).unwrap();
    assert_eq!(vault.total_supply(), 0);
    assert_eq!(vault.liquidity(), 0);
    assert_eq!(vault.idle_balances(), (0, 0));
    assert_token_backing(&vault);

    // Only the fee buckets remain, and they drain completely.
    let pair = vault.pair();
    let buckets = vault.fee_buckets().clone();
    assert!(buckets.manager0 > 0 && buckets.keeper1 > 0);
    let ctx = CallContext::new(keeper(), T0 + 20);
    vault.withdraw_manager_balance(ctx, buckets.manager0, pair.token0).unwrap();
    vault.withdraw_manager_balance(ctx, buckets.manager1, pair.token1).unwrap();
    vault.withdraw_keeper_balance(ctx, buckets.keeper0, pair.token0).unwrap();
    vault.withdraw_keeper_balance(ctx, buckets.keeper1, pair.token1).unwrap();
    assert_eq!(vault.tokens().balance_of(pair.token0, vault.address()), 0);
    assert_eq!(vault.tokens().balance_of(pair.token1, vault.address()), 0);
    assert_eq!(vault.tokens().balance_of(pair.token1, keeper()), buckets.keeper1);

    // The next depositor bootstraps again.
    let again = mint_max(&mut vault, alice(), 1_000, 1_000, T0 + 30);
    assert_eq!(vault.total_supply(), again.shares);
    assert!(vault.liquidity() >= again.shares);
}

#[test]
fn test_failed_rebalance_leaves_no_trace() {
    let mut vault = setup_with(VaultConfig::default().with_params(fee_params()), Q96, 0);
    mint_max(&mut vault, alice(), 1_000_000_000, 1_000_000_000, T0);
    trade(&mut vault, 5_000_000, 2);

    let before_events = vault.events().len();
    let before_pool = vault.pool().clone();
    let before_idle = vault.idle_balances();
    let before_liquidity = vault.liquidity();
    let pair = vault.pair();
    let before_balance = vault.tokens().balance_of(pair.token0, vault.address());

    // The keeper asks for more than its bucket will hold after the harvest.
    let err = vault
        .rebalance(
            CallContext::new(keeper(), T0 + DAY),
            live_price(&vault),
            BasisPoints(5_000),
            u128::MAX,
            pair.token0,
        )
        .unwrap_err();
    assert!(matches!(err, VaultError::InsufficientFeeBalance { .. }));

    assert_eq!(vault.pool(), &before_pool);
    assert_eq!(vault.idle_balances(), before_idle);
    assert_eq!(vault.liquidity(), before_liquidity);
    assert_eq!(vault.fee_buckets(), &FeeBuckets::default());
    assert_eq!(vault.events().len(), before_events);
    assert_eq!(vault.last_rebalance_timestamp(), T0);
    assert_eq!(
        vault.tokens().balance_of(pair.token0, vault.address()),
        before_balance
    );

    // The same rebalance with a payable fee goes through.
    assert!(
        vault
            .rebalance(
                CallContext::new(keeper(), T0 + DAY),
                live_price(&vault),
                BasisPoints(5_000),
                0,
                pair.token0,
            )
            .is_ok()
    );
}

#[test]
fn test_queued_params_govern_later_harvests() {
    let mut vault = setup_with(VaultConfig::default(), Q96, 0);
    mint_max(&mut vault, alice(), 1_000_000_000, 1_000_000_000, T0);

    let update = AdminParams::default()
        .with_fees(BasisPoints(2_000), BasisPoints(0))
        .with_treasury(treasury());
    let effective_at = vault
        .update_admin_params(CallContext::new(manager(), T0), update)
        .unwrap();
    assert_eq!(effective_at, T0 + DAY);

    // Before activation the default 2% keeper cut applies and no manager cut.
    trade(&mut vault, 5_000_000, 2);
    vault
        .burn(CallContext::new(alice(), T0 + 100), 1, alice())
        .unwrap();
    assert_eq!(vault.manager_balances(), (0, 0));
    assert!(vault.keeper_balances().0 > 0);
    let keeper_before = vault.keeper_balances();

    trade(&mut vault, 5_000_000, 2);
    vault
        .burn(CallContext::new(alice(), T0 + DAY), 1, alice())
        .unwrap();
    assert!(vault.manager_balances().0 > 0);
    assert_eq!(vault.keeper_balances(), keeper_before);
    assert_token_backing(&vault);
}

#[test]
fn test_renounced_vault_returns_manager_fees_to_depositors() {
    let mut vault = setup_with(VaultConfig::default().with_params(fee_params()), Q96, 0);
    mint_max(&mut vault, alice(), 1_000_000_000, 1_000_000_000, T0);
    trade(&mut vault, 5_000_000, 2);
    vault
        .rebalance(
            CallContext::new(keeper(), T0 + DAY),
            live_price(&vault),
            BasisPoints::ZERO,
            0,
            vault.pair().token0,
        )
        .unwrap();
    let (manager0, _) = vault.manager_balances();
    assert!(manager0 > 0);
    let before = vault.get_underlying_balances(T0 + DAY).unwrap();

    vault
        .renounce_ownership(CallContext::new(manager(), T0 + DAY))
        .unwrap();
    let after = vault.get_underlying_balances(T0 + DAY).unwrap();
    assert_eq!(after.0, before.0 + manager0);
    assert_eq!(vault.manager_balances(), (0, 0));
    assert_token_backing(&vault);
    assert_eq!(
        vault.withdraw_manager_balance(CallContext::new(keeper(), T0 + DAY), 0, vault.pair().token0),
        Err(VaultError::TreasuryUnset)
    );
}
