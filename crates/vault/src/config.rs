//! Vault construction parameters.

use crate::error::{VaultError, VaultResult};
use crate::params::AdminParams;
use clmm_vault_domain::math::tick_math::{MAX_TICK, MIN_TICK};
use clmm_vault_domain::{Address, TokenPair};
use serde::{Deserialize, Serialize};

/// Everything needed to create a vault, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Share token name.
    pub name: String,
    /// Share token symbol.
    pub symbol: String,
    /// Address the vault holds tokens and its AMM position under.
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Initial range lower tick.
    pub lower_tick: i32,
    /// Initial range upper tick.
    pub upper_tick: i32,
    pub manager: Option<Address>,
    pub keeper: Address,
    #[serde(default)]
    pub params: AdminParams,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            name: "CLMM Vault Share".to_string(),
            symbol: "CVS".to_string(),
            address: Address::from_low_u64_be(0x1000),
            token0: Address::from_low_u64_be(0xa0),
            token1: Address::from_low_u64_be(0xb0),
            lower_tick: -887220,
            upper_tick: 887220,
            manager: Some(Address::from_low_u64_be(0x01)),
            keeper: Address::from_low_u64_be(0x02),
            params: AdminParams::default(),
        }
    }
}

impl VaultConfig {
    /// Parses a JSON config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the config as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Sets the initial range.
    #[must_use]
    pub fn with_range(mut self, lower_tick: i32, upper_tick: i32) -> Self {
        self.lower_tick = lower_tick;
        self.upper_tick = upper_tick;
        self
    }

    /// Sets the token pair.
    #[must_use]
    pub fn with_tokens(mut self, token0: Address, token1: Address) -> Self {
        self.token0 = token0;
        self.token1 = token1;
        self
    }

    /// Sets the admin params.
    #[must_use]
    pub fn with_params(mut self, params: AdminParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the manager and keeper.
    #[must_use]
    pub fn with_roles(mut self, manager: Option<Address>, keeper: Address) -> Self {
        self.manager = manager;
        self.keeper = keeper;
        self
    }

    /// The configured pair, which must already be in canonical order.
    pub fn pair(&self) -> VaultResult<TokenPair> {
        let pair = TokenPair {
            token0: self.token0,
            token1: self.token1,
        };
        if !pair.is_ordered() {
            return Err(VaultError::UnorderedTokens);
        }
        Ok(pair)
    }

    /// Checks everything that does not depend on the pool.
    pub fn validate(&self) -> VaultResult<()> {
        let pair = self.pair()?;
        let addresses = [self.address, pair.token0, self.keeper];
        if addresses.iter().any(Address::is_zero) || self.manager == Some(Address::zero()) {
            return Err(VaultError::ZeroAddress);
        }
        if self.lower_tick >= self.upper_tick
            || self.lower_tick < MIN_TICK
            || self.upper_tick > MAX_TICK
        {
            return Err(VaultError::InvalidRange {
                lower: self.lower_tick,
                upper: self.upper_tick,
            });
        }
        self.params.validate()
    }
}
