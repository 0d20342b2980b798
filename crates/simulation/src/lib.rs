//! Simulated market for the vault.
//!
//! This crate provides in-memory collaborators and market drivers:
//! - A multi-position concentrated-liquidity pool with exact-input swaps
//! - A token ledger holding balances per token and holder
//! - Wash trading and price driving helpers
//! - Seeded price path generators
//! - Simulation configuration

/// Prelude module for convenient imports.
pub mod prelude;

/// Simulation configuration.
pub mod config;
/// In-memory token ledger.
pub mod ledger;
/// Market drivers.
pub mod market;
/// Simulated concentrated-liquidity pool.
pub mod pool;
/// Price path generators.
pub mod price_path;
