//! Admin parameters and their delayed activation.

use crate::error::{VaultError, VaultResult};
use clmm_vault_domain::Address;
use clmm_vault_domain::bps::BasisPoints;
use serde::{Deserialize, Serialize};

/// How much of the post-deposit leftover a rebalance may swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwapPolicy {
    /// Keeper rebalances may not swap.
    Disabled,
    /// Keeper rebalances may swap at most `max_swap_bps` of the leftover.
    Bounded { max_swap_bps: BasisPoints },
}

impl SwapPolicy {
    /// Rejects requests above the cap instead of truncating them.
    pub fn check(&self, requested: BasisPoints) -> VaultResult<()> {
        let allowed = match self {
            SwapPolicy::Disabled => BasisPoints::ZERO,
            SwapPolicy::Bounded { max_swap_bps } => *max_swap_bps,
        };
        if requested > allowed {
            return Err(VaultError::SwapAmountExceeded {
                requested_bps: requested.0,
                allowed_bps: allowed.0,
            });
        }
        Ok(())
    }

    /// True when rebalances may not swap at all.
    pub fn is_disabled(&self) -> bool {
        matches!(self, SwapPolicy::Disabled)
    }
}

/// Tunable vault parameters, owned by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminParams {
    /// Minimum seconds between keeper rebalances; also the activation delay
    /// of parameter updates.
    pub heartbeat_seconds: u64,
    /// Tolerated deviation of the live price from the keeper's hint.
    pub slippage_bps: BasisPoints,
    /// Share of harvested fees credited to the manager.
    pub manager_fee_bps: BasisPoints,
    /// Share of harvested fees credited to the keeper.
    pub keeper_fee_bps: BasisPoints,
    /// Cap on total shares outstanding.
    pub max_total_supply: u128,
    /// Recipient of manager fee withdrawals.
    pub treasury: Option<Address>,
    /// How much of the leftover a keeper rebalance may swap.
    pub swap_policy: SwapPolicy,
}

impl Default for AdminParams {
    fn default() -> Self {
        Self {
            heartbeat_seconds: 86_400,        // 1 day
            slippage_bps: BasisPoints(500),   // 5%
            manager_fee_bps: BasisPoints(0),
            keeper_fee_bps: BasisPoints(200), // 2%
            max_total_supply: u128::MAX,
            treasury: None,
            swap_policy: SwapPolicy::Bounded {
                max_swap_bps: BasisPoints(5_000),
            },
        }
    }
}

impl AdminParams {
    /// Checks that every bps value stays within 100% and the heartbeat is positive.
    pub fn validate(&self) -> VaultResult<()> {
        if self.heartbeat_seconds == 0 {
            return Err(VaultError::InvalidAdminParams(
                "heartbeat must be positive".into(),
            ));
        }
        if !self.slippage_bps.is_valid() {
            return Err(VaultError::InvalidAdminParams(format!(
                "slippage {} above 100%",
                self.slippage_bps
            )));
        }
        let fee_total = self.manager_fee_bps.checked_add(self.keeper_fee_bps);
        if !fee_total.is_some_and(|total| total.is_valid()) {
            return Err(VaultError::InvalidAdminParams(format!(
                "manager fee {} plus keeper fee {} above 100%",
                self.manager_fee_bps, self.keeper_fee_bps
            )));
        }
        if let SwapPolicy::Bounded { max_swap_bps } = self.swap_policy {
            if !max_swap_bps.is_valid() {
                return Err(VaultError::InvalidAdminParams(format!(
                    "max swap {max_swap_bps} above 100%"
                )));
            }
        }
        if self.treasury == Some(Address::zero()) {
            return Err(VaultError::ZeroAddress);
        }
        Ok(())
    }

    /// Sets the heartbeat.
    #[must_use]
    pub fn with_heartbeat(mut self, seconds: u64) -> Self {
        self.heartbeat_seconds = seconds;
        self
    }

    /// Sets the manager and keeper fee shares.
    #[must_use]
    pub fn with_fees(mut self, manager: BasisPoints, keeper: BasisPoints) -> Self {
        self.manager_fee_bps = manager;
        self.keeper_fee_bps = keeper;
        self
    }

    /// Sets the slippage tolerance.
    #[must_use]
    pub fn with_slippage(mut self, slippage: BasisPoints) -> Self {
        self.slippage_bps = slippage;
        self
    }

    /// Sets the treasury.
    #[must_use]
    pub fn with_treasury(mut self, treasury: Address) -> Self {
        self.treasury = Some(treasury);
        self
    }

    /// Sets the swap policy.
    #[must_use]
    pub fn with_swap_policy(mut self, policy: SwapPolicy) -> Self {
        self.swap_policy = policy;
        self
    }

    /// Sets the supply cap.
    #[must_use]
    pub fn with_max_total_supply(mut self, cap: u128) -> Self {
        self.max_total_supply = cap;
        self
    }
}

/// Admin params together with an update waiting to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminParamsSlot {
    Active {
        value: AdminParams,
    },
    Pending {
        value: AdminParams,
        effective_at: u64,
        /// Params in force until `effective_at`.
        previous: AdminParams,
    },
}

impl AdminParamsSlot {
    /// Slot holding `value` as already active.
    pub fn new(value: AdminParams) -> Self {
        AdminParamsSlot::Active { value }
    }

    /// Params in force at `now`.
    pub fn resolve(&self, now: u64) -> &AdminParams {
        match self {
            AdminParamsSlot::Active { value } => value,
            AdminParamsSlot::Pending {
                value,
                effective_at,
                previous,
            } => {
                if now >= *effective_at {
                    value
                } else {
                    previous
                }
            }
        }
    }

    /// Promotes a matured pending update.
    pub fn settle(&mut self, now: u64) {
        if let AdminParamsSlot::Pending {
            value,
            effective_at,
            ..
        } = self
        {
            if now >= *effective_at {
                *self = AdminParamsSlot::Active {
                    value: value.clone(),
                };
            }
        }
    }

    /// Queues `value` to take effect one active heartbeat from `now`,
    /// replacing any update that has not matured yet. Returns the
    /// activation time.
    pub fn queue(&mut self, value: AdminParams, now: u64) -> u64 {
        self.settle(now);
        let active = self.resolve(now).clone();
        let effective_at = now.saturating_add(active.heartbeat_seconds);
        *self = AdminParamsSlot::Pending {
            value,
            effective_at,
            previous: active,
        };
        effective_at
    }

    /// The queued update and its activation time, if any.
    pub fn pending(&self) -> Option<(&AdminParams, u64)> {
        match self {
            AdminParamsSlot::Active { .. } => None,
            AdminParamsSlot::Pending {
                value,
                effective_at,
                ..
            } => Some((value, *effective_at)),
        }
    }

    /// Applies `f` to the active params and to any queued update.
    pub fn update_all(&mut self, mut f: impl FnMut(&mut AdminParams)) {
        match self {
            AdminParamsSlot::Active { value } => f(value),
            AdminParamsSlot::Pending {
                value, previous, ..
            } => {
                f(value);
                f(previous);
            }
        }
    }
}
