//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_vault_core::prelude::*;
//! ```

// Accounting
pub use crate::accounting::{MintAmounts, compute_mint_amounts};

// Config
pub use crate::config::VaultConfig;

// Errors
pub use crate::error::{VaultError, VaultResult};

// Events
pub use crate::events::{
    EventData, EventLog, EventSummary, RebalanceReason, VaultEvent, VaultEventType,
};

// Fees
pub use crate::fees::{Bucket, FeeBuckets, FeeSplit};

// Params
pub use crate::params::{AdminParams, AdminParamsSlot, SwapPolicy};

// Roles
pub use crate::roles::{Role, Roles};

// Vault
pub use crate::vault::{
    BurnReceipt, CallContext, Harvest, MintReceipt, RebalanceReport, SwapLeg, Vault,
    VaultSummary,
};
