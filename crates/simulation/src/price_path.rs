//! Price path generators driving simulated markets.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

pub trait PricePathGenerator {
    /// Initial price followed by `steps` prices.
    fn generate(&mut self, steps: usize) -> Vec<Decimal>;
}

/// Seeded geometric Brownian motion.
#[derive(Debug, Clone)]
pub struct GeometricBrownianMotion {
    pub initial_price: Decimal,
    pub drift: f64,      // annualized drift (mu)
    pub volatility: f64, // annualized volatility (sigma)
    pub time_step: f64,  // time step in years (dt) e.g. 1/365 for daily
    rng: StdRng,
}

impl GeometricBrownianMotion {
    pub fn new(initial_price: Decimal, drift: f64, volatility: f64, time_step: f64, seed: u64) -> Self {
        Self {
            initial_price,
            drift,
            volatility,
            time_step,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PricePathGenerator for GeometricBrownianMotion {
    fn generate(&mut self, steps: usize) -> Vec<Decimal> {
        let mut prices = Vec::with_capacity(steps + 1);
        prices.push(self.initial_price);

        let dt = self.time_step;
        let drift_term = (self.drift - 0.5 * self.volatility.powi(2)) * dt;
        let vol_term = self.volatility * dt.sqrt();

        let mut current_price = self.initial_price.to_f64().unwrap_or(0.0);
        let mut last = self.initial_price;

        for _ in 0..steps {
            let z: f64 = StandardNormal.sample(&mut self.rng);
            current_price *= (drift_term + vol_term * z).exp();

            // A price that no longer fits a Decimal repeats the last one.
            last = Decimal::from_f64(current_price)
                .filter(|p| p.is_sign_positive() && !p.is_zero())
                .map(|p| p.round_dp(12))
                .unwrap_or(last);
            prices.push(last);
        }

        prices
    }
}

/// Replays a fixed list of prices.
#[derive(Debug, Clone)]
pub struct DeterministicPricePath {
    pub prices: Vec<Decimal>,
}

impl PricePathGenerator for DeterministicPricePath {
    fn generate(&mut self, steps: usize) -> Vec<Decimal> {
        self.prices.iter().copied().take(steps + 1).collect()
    }
}
