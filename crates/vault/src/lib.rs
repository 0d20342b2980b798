//! Managed concentrated-liquidity vault.
//!
//! This crate provides the vault engine:
//! - Fungible share accounting with rounding in favour of existing holders
//! - Keeper rebalances gated by heartbeat and slippage
//! - Manager executive rebalances and delayed admin params
//! - Manager and keeper fee buckets
//! - All-or-nothing operations with a reentrancy lock

/// Prelude module for convenient imports.
pub mod prelude;

/// Share and underlying conversion.
pub mod accounting;
/// Vault construction parameters.
pub mod config;
/// Vault errors.
pub mod error;
/// Event log.
pub mod events;
/// Fee split and buckets.
pub mod fees;
/// Reentrancy lock.
pub mod guard;
/// Admin params and their delayed activation.
pub mod params;
/// Range position and idle balances.
pub mod position;
/// Rebalance gates and leftover swap planning.
pub mod rebalance;
/// Manager and keeper roles.
pub mod roles;
/// Share ledger.
pub mod shares;
/// The vault itself.
pub mod vault;
