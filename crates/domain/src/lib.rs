//! Domain types and fixed-point math for the concentrated-liquidity vault.
//!
//! This crate holds everything the vault core and its collaborators share:
//! - Fixed-point math (`math::*`): mulDiv with rounding, integer square root,
//!   tick ↔ sqrt-price conversion and liquidity ↔ token amount conversion
//! - Token, address and basis-point value types
//! - The collaborator interfaces the vault consumes: the AMM (`amm`) and the
//!   underlying token ledger (`ledger`)

/// AMM collaborator interface.
pub mod amm;
/// Basis-point value type.
pub mod bps;
/// Math error type.
pub mod error;
/// Fee tiers of the underlying AMM.
pub mod fees;
/// Token ledger collaborator interface and transactional snapshots.
pub mod ledger;
/// Fixed-point math.
pub mod math;
/// Token and address types.
pub mod token;

pub use error::MathError;
pub use primitive_types::{U256, U512};
pub use token::{Address, Token, TokenPair};
