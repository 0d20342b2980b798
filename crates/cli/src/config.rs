//! CLI configuration file: the vault and the simulated market around it.

use anyhow::{Context, Result};
use clmm_vault_core::config::VaultConfig;
use clmm_vault_simulation::config::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "CLMM_VAULT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.vault.validate().context("invalid vault config")?;
        self.simulation
            .validate()
            .context("invalid simulation config")?;
        let spacing = self.simulation.fee_tier.tick_spacing;
        if self.vault.lower_tick % spacing != 0 || self.vault.upper_tick % spacing != 0 {
            anyhow::bail!(
                "vault range [{}, {}] is not aligned to tick spacing {spacing}",
                self.vault.lower_tick,
                self.vault.upper_tick
            );
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing config")
    }
}
