//! Fungible share token of the vault.

use crate::error::{VaultError, VaultResult};
use clmm_vault_domain::{Address, MathError};
use std::collections::HashMap;

/// Shares use 18 decimals.
pub const SHARE_DECIMALS: u8 = 18;

/// Share balances and allowances. `total_supply` always equals the sum of
/// all balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLedger {
    name: String,
    symbol: String,
    total_supply: u128,
    balances: HashMap<Address, u128>,
    /// Keyed by `(owner, spender)`.
    allowances: HashMap<(Address, Address), u128>,
}

impl ShareLedger {
    /// Empty ledger for a share token named `name`.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Share token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Share token symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Share decimals, always 18.
    pub fn decimals(&self) -> u8 {
        SHARE_DECIMALS
    }

    /// Shares outstanding.
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Shares held by `holder`.
    pub fn balance_of(&self, holder: Address) -> u128 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    /// Shares `spender` may move on behalf of `owner`.
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Number of accounts holding a nonzero balance.
    pub fn holders(&self) -> usize {
        self.balances.len()
    }

    /// Credits `amount` new shares to `to`.
    pub fn mint(&mut self, to: Address, amount: u128) -> VaultResult<()> {
        if to.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        self.total_supply = total_supply;
        self.set_balance(to, balance);
        Ok(())
    }

    /// Destroys `amount` of `from`'s shares.
    pub fn burn(&mut self, from: Address, amount: u128) -> VaultResult<()> {
        let available = self.balance_of(from);
        let balance = available
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance {
                requested: amount,
                available,
            })?;
        self.total_supply -= amount;
        self.set_balance(from, balance);
        Ok(())
    }

    /// Moves `amount` shares between holders.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> VaultResult<()> {
        if to.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if from != to {
            let credited = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(MathError::Overflow)?;
            self.set_balance(from, available - amount);
            self.set_balance(to, credited);
        }
        Ok(())
    }

    /// Sets the allowance of `spender` over `owner`'s shares.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) -> VaultResult<()> {
        if spender.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        Ok(())
    }

    /// Moves `amount` from `owner` to `to` on behalf of `spender`. An
    /// allowance of `u128::MAX` is never decreased.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: u128,
    ) -> VaultResult<()> {
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(VaultError::InsufficientAllowance {
                requested: amount,
                available: allowed,
            });
        }
        self.transfer(owner, to, amount)?;
        if allowed != u128::MAX {
            self.approve(owner, spender, allowed - amount)?;
        }
        Ok(())
    }

    fn set_balance(&mut self, holder: Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn sum_of_balances(ledger: &ShareLedger) -> u128 {
        ledger.balances.values().sum()
    }

    #[test]
    fn test_mint_burn_keep_supply_consistent() {
        let mut ledger = ShareLedger::new("Vault Share", "VS");
        ledger.mint(addr(1), 1_000).unwrap();
        ledger.mint(addr(2), 500).unwrap();
        ledger.burn(addr(1), 400).unwrap();

        assert_eq!(ledger.total_supply(), 1_100);
        assert_eq!(sum_of_balances(&ledger), ledger.total_supply());
        assert_eq!(
            ledger.burn(addr(2), 501),
            Err(VaultError::InsufficientBalance {
                requested: 501,
                available: 500
            })
        );
        assert_eq!(ledger.mint(Address::zero(), 1), Err(VaultError::ZeroAddress));
    }

    #[test]
    fn test_transfer() {
        let mut ledger = ShareLedger::new("Vault Share", "VS");
        ledger.mint(addr(1), 100).unwrap();
        ledger.transfer(addr(1), addr(2), 100).unwrap();

        assert_eq!(ledger.balance_of(addr(1)), 0);
        assert_eq!(ledger.balance_of(addr(2)), 100);
        assert_eq!(ledger.holders(), 1);

        ledger.transfer(addr(2), addr(2), 100).unwrap();
        assert_eq!(ledger.balance_of(addr(2)), 100);
        assert!(ledger.transfer(addr(1), addr(2), 1).is_err());
        assert_eq!(sum_of_balances(&ledger), ledger.total_supply());
    }

    #[test]
    fn test_allowance_flow() {
        let mut ledger = ShareLedger::new("Vault Share", "VS");
        ledger.mint(addr(1), 100).unwrap();
        ledger.approve(addr(1), addr(3), 60).unwrap();

        ledger.transfer_from(addr(3), addr(1), addr(2), 40).unwrap();
        assert_eq!(ledger.allowance(addr(1), addr(3)), 20);
        assert_eq!(
            ledger.transfer_from(addr(3), addr(1), addr(2), 21),
            Err(VaultError::InsufficientAllowance {
                requested: 21,
                available: 20
            })
        );

        ledger.approve(addr(1), addr(3), u128::MAX).unwrap();
        ledger.transfer_from(addr(3), addr(1), addr(2), 10).unwrap();
        assert_eq!(ledger.allowance(addr(1), addr(3)), u128::MAX);
        assert_eq!(ledger.balance_of(addr(2)), 50);
    }

    #[test]
    fn test_metadata() {
        let ledger = ShareLedger::new("Vault Share", "VS");
        assert_eq!(ledger.name(), "Vault Share");
        assert_eq!(ledger.symbol(), "VS");
        assert_eq!(ledger.decimals(), 18);
    }
}
