//! Vault error taxonomy.

use crate::roles::Role;
use clmm_vault_domain::MathError;
use clmm_vault_domain::amm::AmmError;
use clmm_vault_domain::ledger::TokenLedgerError;
use clmm_vault_domain::Address;
use thiserror::Error;

/// Errors returned by vault operations. Any error aborts the whole
/// operation and leaves no partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Share amount is zero or maps to zero underlying.
    #[error("invalid share amount")]
    InvalidShareAmount,

    /// Caller holds fewer shares than requested.
    #[error("insufficient share balance: {available} available, {requested} requested")]
    InsufficientBalance { requested: u128, available: u128 },

    /// Spender allowance is below the transfer amount.
    #[error("insufficient allowance: {available} available, {requested} requested")]
    InsufficientAllowance { requested: u128, available: u128 },

    /// Mint would push total supply over the configured cap.
    #[error("supply cap exceeded: cap {cap}, requested total {requested}")]
    SupplyCapExceeded { cap: u128, requested: u128 },

    /// Heartbeat has not elapsed since the last rebalance.
    #[error("rebalance too soon: {remaining}s remaining")]
    RebalanceTooSoon { remaining: u64 },

    /// Live price is outside the tolerated band around the hint.
    #[error("live price deviates from the hint by more than {slippage_bps}bps")]
    SlippageExceeded { slippage_bps: u16 },

    /// Caller lacks the role the operation requires.
    #[error("{caller:?} is not authorized as {role:?}")]
    Unauthorized { caller: Address, role: Role },

    /// Fee bucket holds less than the requested withdrawal.
    #[error("insufficient fee balance: {available} available, {requested} requested")]
    InsufficientFeeBalance { requested: u128, available: u128 },

    /// A mutating operation is already in flight.
    #[error("reentrant call blocked")]
    ReentrancyBlocked,

    #[error("invalid tick range [{lower}, {upper}]")]
    InvalidRange { lower: i32, upper: i32 },

    #[error("invalid admin params: {0}")]
    InvalidAdminParams(String),

    /// Requested swap share is not allowed by the swap policy.
    #[error("swap of {requested_bps}bps exceeds the allowed {allowed_bps}bps")]
    SwapAmountExceeded { requested_bps: u16, allowed_bps: u16 },

    #[error("token {0:?} is not part of the vault pair")]
    UnknownToken(Address),

    #[error("treasury address is not set")]
    TreasuryUnset,

    #[error("zero address")]
    ZeroAddress,

    #[error("tokens are not ordered: token0 must sort below token1")]
    UnorderedTokens,

    /// The AMM rejected a call or returned amounts outside what was offered.
    #[error("AMM call failed: {0}")]
    AmmCallFailed(#[from] AmmError),

    #[error("token transfer failed: {0}")]
    TokenTransferFailed(#[from] TokenLedgerError),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
