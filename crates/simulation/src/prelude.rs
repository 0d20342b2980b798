//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_vault_simulation::prelude::*;
//! ```

// Config
pub use crate::config::{SimulationConfig, SimulationConfigError};

// Ledger
pub use crate::ledger::InMemoryTokenLedger;

// Market
pub use crate::market::{WashTradeReport, drive_to_price, wash_trade};

// Pool
pub use crate::pool::SimulatedPool;

// Price path generators
pub use crate::price_path::{DeterministicPricePath, GeometricBrownianMotion, PricePathGenerator};
