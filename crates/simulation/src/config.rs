//! Configuration of a simulated vault lifecycle.

use clmm_vault_domain::bps::BasisPoints;
use clmm_vault_domain::fees::FeeTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationConfigError {
    #[error("initial price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("invalid fee tier {0:?}")]
    InvalidFeeTier(FeeTier),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("swap share {0} exceeds 100%")]
    InvalidSwapShare(BasisPoints),

    #[error("volatility must be finite and non-negative")]
    InvalidVolatility,
}

/// Market and participant settings for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Initial token1-per-token0 price.
    pub initial_price: Decimal,
    /// Fee tier of the simulated pool.
    pub fee_tier: FeeTier,
    /// Full-range liquidity provided by an outside LP.
    pub external_liquidity: u128,
    /// Number of depositors minting at the start.
    pub depositors: u32,
    /// Token budget of each depositor, per token.
    pub deposit_amount: u128,
    /// Number of simulation steps.
    pub steps: usize,
    /// Step duration in seconds.
    pub step_duration_seconds: u64,
    /// Annualized drift of the price path.
    pub drift: f64,
    /// Annualized volatility of the price path.
    pub volatility: f64,
    /// Token0 swapped per wash-trade round.
    pub trade_size: u128,
    /// Wash-trade rounds per step.
    pub trades_per_step: u32,
    /// Share of the leftover swapped during rebalances.
    pub rebalance_swap_bps: BasisPoints,
    /// Half-width in ticks of the range the manager recenters to when the
    /// price leaves the current one. Zero disables recentering.
    pub recenter_half_width: i32,
    /// Seed of the price path.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_price: Decimal::ONE,
            fee_tier: FeeTier::MEDIUM,
            external_liquidity: 1_000_000_000_000,
            depositors: 3,
            deposit_amount: 1_000_000_000,
            steps: 48,
            step_duration_seconds: 3600, // 1 hour
            drift: 0.0,
            volatility: 0.8,
            trade_size: 50_000_000,
            trades_per_step: 2,
            rebalance_swap_bps: BasisPoints(5_000),
            recenter_half_width: 1_200,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Sets the initial price.
    #[must_use]
    pub fn with_initial_price(mut self, price: Decimal) -> Self {
        self.initial_price = price;
        self
    }

    /// Sets the fee tier.
    #[must_use]
    pub fn with_fee_tier(mut self, fee_tier: FeeTier) -> Self {
        self.fee_tier = fee_tier;
        self
    }

    /// Sets the number of steps.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the step duration.
    #[must_use]
    pub fn with_step_duration(mut self, seconds: u64) -> Self {
        self.step_duration_seconds = seconds;
        self
    }

    /// Sets drift and volatility of the price path.
    #[must_use]
    pub fn with_price_dynamics(mut self, drift: f64, volatility: f64) -> Self {
        self.drift = drift;
        self.volatility = volatility;
        self
    }

    /// Sets the depositor count and per-token budget.
    #[must_use]
    pub fn with_depositors(mut self, depositors: u32, deposit_amount: u128) -> Self {
        self.depositors = depositors;
        self.deposit_amount = deposit_amount;
        self
    }

    /// Sets the wash-trade volume per step.
    #[must_use]
    pub fn with_trading(mut self, trade_size: u128, trades_per_step: u32) -> Self {
        self.trade_size = trade_size;
        self.trades_per_step = trades_per_step;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns total simulation duration in seconds.
    #[must_use]
    pub fn total_duration_seconds(&self) -> u64 {
        self.steps as u64 * self.step_duration_seconds
    }

    /// Step length as a fraction of a year, for the price path.
    #[must_use]
    pub fn time_step_years(&self) -> f64 {
        self.step_duration_seconds as f64 / (365.0 * 86400.0)
    }

    pub fn validate(&self) -> Result<(), SimulationConfigError> {
        if self.initial_price <= Decimal::ZERO {
            return Err(SimulationConfigError::NonPositivePrice(self.initial_price));
        }
        if !self.fee_tier.is_valid() {
            return Err(SimulationConfigError::InvalidFeeTier(self.fee_tier));
        }
        if self.external_liquidity == 0 {
            return Err(SimulationConfigError::Zero("external_liquidity"));
        }
        if self.step_duration_seconds == 0 {
            return Err(SimulationConfigError::Zero("step_duration_seconds"));
        }
        if !self.rebalance_swap_bps.is_valid() {
            return Err(SimulationConfigError::InvalidSwapShare(self.rebalance_swap_bps));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 || !self.drift.is_finite() {
            return Err(SimulationConfigError::InvalidVolatility);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_duration() {
        let config = SimulationConfig::default()
            .with_steps(720) // 30 days of hourly data
            .with_step_duration(3600);
        assert_eq!(config.total_duration_seconds(), 720 * 3600);
        assert!((config.time_step_years() - 1.0 / 8760.0).abs() < 1e-12);
    }

    #[test]
    fn test_validation() {
        let config = SimulationConfig::default().with_initial_price(dec!(0));
        assert_eq!(
            config.validate(),
            Err(SimulationConfigError::NonPositivePrice(dec!(0)))
        );

        let config = SimulationConfig::default().with_step_duration(0);
        assert_eq!(
            config.validate(),
            Err(SimulationConfigError::Zero("step_duration_seconds"))
        );

        let config = SimulationConfig::default().with_price_dynamics(0.0, -1.0);
        assert_eq!(config.validate(), Err(SimulationConfigError::InvalidVolatility));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "steps": 10, "seed": 7, "initial_price": "2.5" }"#).unwrap();
        assert_eq!(config.steps, 10);
        assert_eq!(config.seed, 7);
        assert_eq!(config.initial_price, dec!(2.5));
        assert_eq!(config.fee_tier, FeeTier::MEDIUM);
    }
}
