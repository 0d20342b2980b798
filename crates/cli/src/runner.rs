//! Simulated vault lifecycle: depositors enter, the market moves, the
//! manager and keeper run the vault, everyone exits.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clmm_vault_core::prelude::*;
use clmm_vault_domain::amm::{ConcentratedPool, RangeOracle};
use clmm_vault_domain::bps::BasisPoints;
use clmm_vault_domain::math::price_tick::{price_to_sqrt_price_x96, sqrt_price_x96_to_price};
use clmm_vault_domain::math::{MAX_TICK, MIN_TICK};
use clmm_vault_domain::{Address, TokenPair};
use clmm_vault_simulation::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Unix time of the first simulated block.
pub const START_TIMESTAMP: u64 = 1_700_000_000;

const POOL_ADDRESS: u64 = 0x2000;
const TRADER_ADDRESS: u64 = 0x3000;
const OUTSIDE_LP_ADDRESS: u64 = 0x3001;
const DEPOSITOR_BASE: u64 = 0x1000_0000;

/// Balance handed to the trader and the outside LP, per token.
const MARKET_FUNDING: u128 = 1_000_000_000_000_000_000_000_000_000;

type SimulatedVault = Vault<SimulatedPool, InMemoryTokenLedger>;

/// What one depositor put in and took out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositorOutcome {
    pub depositor: Address,
    pub shares: u128,
    pub deposited0: u128,
    pub deposited1: u128,
    pub withdrawn0: u128,
    pub withdrawn1: u128,
}

/// Counters of what happened during the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub keeper_rebalances: usize,
    pub executive_rebalances: usize,
    pub skipped_rebalances: usize,
    pub failed_operations: usize,
    pub wash_rounds: u32,
    pub volume0: u128,
    pub volume1: u128,
}

/// Fees that left the vault through the buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayouts {
    pub keeper0: u128,
    pub keeper1: u128,
    pub treasury0: u128,
    pub treasury1: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub generated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub steps: usize,
    pub initial_price: Decimal,
    pub final_price: Decimal,
    pub activity: ActivityCounts,
    pub payouts: FeePayouts,
    /// Vault state after the last step, before depositors exit.
    pub vault: VaultSummary,
    pub events: EventSummary,
    pub depositors: Vec<DepositorOutcome>,
}

/// Runs the whole lifecycle and returns the report and the vault's log.
pub fn run(config: &AppConfig) -> Result<(SimulationReport, EventLog)> {
    config.validate()?;
    let mut simulation = Simulation::new(config)?;
    simulation.deposit_all()?;

    let mut path = GeometricBrownianMotion::new(
        config.simulation.initial_price,
        config.simulation.drift,
        config.simulation.volatility,
        config.simulation.time_step_years(),
        config.simulation.seed,
    );
    let prices = path.generate(config.simulation.steps);
    for (step, price) in prices.iter().skip(1).enumerate() {
        simulation.step(step, *price);
    }

    let vault = simulation.vault.summary(simulation.now)?;
    let final_price = sqrt_price_x96_to_price(vault.sqrt_price_x96)?;
    let ended_at = simulation.now;
    simulation.exit_all()?;

    let report = SimulationReport {
        generated_at: Utc::now(),
        started_at: DateTime::from_timestamp(START_TIMESTAMP as i64, 0),
        ended_at: DateTime::from_timestamp(ended_at as i64, 0),
        steps: config.simulation.steps,
        initial_price: config.simulation.initial_price,
        final_price,
        activity: simulation.activity,
        payouts: simulation.payouts,
        vault,
        events: simulation.vault.events().summary(),
        depositors: simulation.outcomes,
    };
    Ok((report, simulation.vault.events().clone()))
}

struct Simulation<'a> {
    config: &'a AppConfig,
    vault: SimulatedVault,
    pair: TokenPair,
    trader: Address,
    now: u64,
    activity: ActivityCounts,
    payouts: FeePayouts,
    outcomes: Vec<DepositorOutcome>,
}

impl<'a> Simulation<'a> {
    fn new(config: &'a AppConfig) -> Result<Self> {
        let sim = &config.simulation;
        let pair = config.vault.pair()?;
        let mut pool = SimulatedPool::with_price(
            Address::from_low_u64_be(POOL_ADDRESS),
            pair,
            sim.fee_tier,
            sim.initial_price,
        )
        .context("creating pool")?;

        let trader = Address::from_low_u64_be(TRADER_ADDRESS);
        let outside_lp = Address::from_low_u64_be(OUTSIDE_LP_ADDRESS);
        let mut tokens = InMemoryTokenLedger::new();
        for holder in [trader, outside_lp] {
            tokens.mint(pair.token0, holder, MARKET_FUNDING);
            tokens.mint(pair.token1, holder, MARKET_FUNDING);
        }
        let outcomes: Vec<DepositorOutcome> = (0..u64::from(sim.depositors))
            .map(|i| DepositorOutcome {
                depositor: Address::from_low_u64_be(DEPOSITOR_BASE + i),
                shares: 0,
                deposited0: 0,
                deposited1: 0,
                withdrawn0: 0,
                withdrawn1: 0,
            })
            .collect();
        for outcome in &outcomes {
            tokens.mint(pair.token0, outcome.depositor, sim.deposit_amount);
            tokens.mint(pair.token1, outcome.depositor, sim.deposit_amount);
        }

        let (lower, upper) = full_range(sim.fee_tier.tick_spacing);
        pool.add_liquidity(&mut tokens, outside_lp, lower, upper, sim.external_liquidity)
            .context("seeding external liquidity")?;

        let vault = Vault::new(&config.vault, pool, tokens, START_TIMESTAMP)?;
        info!(
            vault = ?vault.address(),
            lower_tick = vault.lower_tick(),
            upper_tick = vault.upper_tick(),
            depositors = sim.depositors,
            "Simulation initialized"
        );
        Ok(Self {
            config,
            vault,
            pair,
            trader,
            now: START_TIMESTAMP,
            activity: ActivityCounts::default(),
            payouts: FeePayouts::default(),
            outcomes,
        })
    }

    fn deposit_all(&mut self) -> Result<()> {
        let budget = self.config.simulation.deposit_amount;
        for outcome in &mut self.outcomes {
            let quote = self.vault.get_mint_amounts(budget, budget, self.now)?;
            if quote.shares == 0 {
                warn!(depositor = ?outcome.depositor, "Deposit too small for a share");
                continue;
            }
            let ctx = CallContext::new(outcome.depositor, self.now);
            let receipt = self
                .vault
                .mint(ctx, quote.shares, outcome.depositor)
                .with_context(|| format!("minting for {:?}", outcome.depositor))?;
            outcome.shares = receipt.shares;
            outcome.deposited0 = receipt.amount0;
            outcome.deposited1 = receipt.amount1;
        }
        Ok(())
    }

    fn step(&mut self, step: usize, price: Decimal) {
        self.now += self.config.simulation.step_duration_seconds;
        self.move_market(price);
        self.trade();

        let tick = match self.vault.pool().slot() {
            Ok(slot) => slot.tick,
            Err(error) => {
                warn!(step, %error, "Pool slot unavailable");
                self.activity.failed_operations += 1;
                return;
            }
        };
        let in_range = tick >= self.vault.lower_tick() && tick < self.vault.upper_tick();
        if !in_range && self.config.simulation.recenter_half_width > 0 {
            self.recenter(step, tick);
        } else {
            self.keeper_rebalance(step);
        }
    }

    fn move_market(&mut self, price: Decimal) {
        let target = match price_to_sqrt_price_x96(price) {
            Ok(target) => target,
            Err(error) => {
                warn!(%price, %error, "Price outside the representable range");
                return;
            }
        };
        let trader = self.trader;
        let (pool, tokens) = self.vault.collaborators_mut();
        if let Err(error) = drive_to_price(pool, tokens, trader, target) {
            warn!(%price, %error, "Price move failed");
            self.activity.failed_operations += 1;
        }
    }

    fn trade(&mut self) {
        let sim = &self.config.simulation;
        let (size, rounds) = (sim.trade_size, sim.trades_per_step);
        let trader = self.trader;
        let (pool, tokens) = self.vault.collaborators_mut();
        match wash_trade(pool, tokens, trader, size, rounds) {
            Ok(report) => {
                self.activity.wash_rounds += report.rounds;
                self.activity.volume0 = self.activity.volume0.saturating_add(report.volume0);
                self.activity.volume1 = self.activity.volume1.saturating_add(report.volume1);
            }
            Err(error) => {
                warn!(%error, "Wash trading failed");
                self.activity.failed_operations += 1;
            }
        }
    }

    /// Manager moves the range around the live tick.
    fn recenter(&mut self, step: usize, tick: i32) {
        let Some(manager) = self.vault.manager() else {
            debug!(step, "No manager to recenter");
            return;
        };
        let spacing = self.config.simulation.fee_tier.tick_spacing;
        let (lower, upper) = centered_range(tick, self.config.simulation.recenter_half_width, spacing);
        let hint = match self.vault.pool().slot() {
            Ok(slot) => slot.sqrt_price_x96,
            Err(_) => return,
        };
        let ctx = CallContext::new(manager, self.now);
        match self.vault.executive_rebalance(
            ctx,
            lower,
            upper,
            hint,
            self.config.simulation.rebalance_swap_bps,
        ) {
            Ok(report) => {
                self.activity.executive_rebalances += 1;
                info!(
                    step,
                    lower_tick = report.new_lower_tick,
                    upper_tick = report.new_upper_tick,
                    liquidity = report.new_liquidity,
                    "Range recentered"
                );
            }
            Err(error) => {
                warn!(step, %error, "Executive rebalance failed");
                self.activity.failed_operations += 1;
            }
        }
    }

    /// Keeper rebalances when the heartbeat allows, then sweeps the fee
    /// buckets.
    fn keeper_rebalance(&mut self, step: usize) {
        let params = self.vault.admin_params(self.now).clone();
        if self.now.saturating_sub(self.vault.last_rebalance_timestamp()) < params.heartbeat_seconds {
            self.activity.skipped_rebalances += 1;
            return;
        }
        let hint = match self.vault.pool().slot() {
            Ok(slot) => slot.sqrt_price_x96,
            Err(_) => return,
        };
        let swap_bps = match params.swap_policy {
            SwapPolicy::Disabled => BasisPoints::ZERO,
            SwapPolicy::Bounded { max_swap_bps } => {
                self.config.simulation.rebalance_swap_bps.min(max_swap_bps)
            }
        };
        let keeper = self.vault.keeper();
        let ctx = CallContext::new(keeper, self.now);
        match self.vault.rebalance(ctx, hint, swap_bps, 0, self.pair.token0) {
            Ok(report) => {
                self.activity.keeper_rebalances += 1;
                debug!(step, liquidity = report.new_liquidity, "Keeper rebalance done");
            }
            Err(error) => {
                warn!(step, %error, "Keeper rebalance failed");
                self.activity.failed_operations += 1;
                return;
            }
        }
        self.sweep_buckets(params.treasury.is_some());
    }

    fn sweep_buckets(&mut self, has_treasury: bool) {
        let ctx = CallContext::new(self.vault.keeper(), self.now);
        let (token0, token1) = (self.pair.token0, self.pair.token1);

        let (keeper0, keeper1) = self.vault.keeper_balances();
        for (token, amount, paid) in [
            (token0, keeper0, &mut self.payouts.keeper0),
            (token1, keeper1, &mut self.payouts.keeper1),
        ] {
            if amount == 0 {
                continue;
            }
            match self.vault.withdraw_keeper_balance(ctx, amount, token) {
                Ok(()) => *paid = paid.saturating_add(amount),
                Err(error) => {
                    warn!(%error, "Keeper withdrawal failed");
                    self.activity.failed_operations += 1;
                }
            }
        }

        if !has_treasury {
            return;
        }
        let (manager0, manager1) = self.vault.manager_balances();
        for (token, amount, paid) in [
            (token0, manager0, &mut self.payouts.treasury0),
            (token1, manager1, &mut self.payouts.treasury1),
        ] {
            if amount == 0 {
                continue;
            }
            match self.vault.withdraw_manager_balance(ctx, amount, token) {
                Ok(()) => *paid = paid.saturating_add(amount),
                Err(error) => {
                    warn!(%error, "Treasury withdrawal failed");
                    self.activity.failed_operations += 1;
                }
            }
        }
    }

    fn exit_all(&mut self) -> Result<()> {
        for outcome in &mut self.outcomes {
            let shares = self.vault.balance_of(outcome.depositor);
            if shares == 0 {
                continue;
            }
            let ctx = CallContext::new(outcome.depositor, self.now);
            let receipt = self
                .vault
                .burn(ctx, shares, outcome.depositor)
                .with_context(|| format!("burning for {:?}", outcome.depositor))?;
            outcome.withdrawn0 = receipt.amount0;
            outcome.withdrawn1 = receipt.amount1;
        }
        Ok(())
    }
}

/// Widest range usable at `tick_spacing`.
fn full_range(tick_spacing: i32) -> (i32, i32) {
    let upper = MAX_TICK / tick_spacing * tick_spacing;
    let lower = MIN_TICK / tick_spacing * tick_spacing;
    (lower, upper)
}

/// Range of roughly `half_width` ticks each side of `tick`, on spacing
/// multiples and inside the usable tick range.
fn centered_range(tick: i32, half_width: i32, tick_spacing: i32) -> (i32, i32) {
    let center = tick.div_euclid(tick_spacing) * tick_spacing;
    let half = (half_width / tick_spacing).max(1) * tick_spacing;
    let (min_usable, max_usable) = full_range(tick_spacing);
    let lower = center.saturating_sub(half).max(min_usable);
    let upper = center
        .saturating_add(half)
        .min(max_usable)
        .max(lower + tick_spacing);
    (lower, upper)
}
