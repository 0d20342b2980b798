//! In-memory balances of the underlying tokens.

use clmm_vault_domain::Address;
use clmm_vault_domain::ledger::{TokenLedger, TokenLedgerError, Transactional};
use std::collections::HashMap;

/// Balances keyed by `(token, holder)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTokenLedger {
    balances: HashMap<(Address, Address), u128>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `amount` of `token` out of thin air for `holder`.
    pub fn mint(&mut self, token: Address, holder: Address, amount: u128) {
        let balance = self.balances.entry((token, holder)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Total of `token` held by everyone.
    pub fn total_of(&self, token: Address) -> u128 {
        self.balances
            .iter()
            .filter(|((t, _), _)| *t == token)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, token: Address, holder: Address) -> u128 {
        self.balances.get(&(token, holder)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenLedgerError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(TokenLedgerError::InsufficientFunds {
                token,
                holder: from,
                requested: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(TokenLedgerError::BalanceOverflow { holder: to })?;

        self.balances.insert((token, from), available - amount);
        self.balances.insert((token, to), credited);
        Ok(())
    }
}

impl Transactional for InMemoryTokenLedger {
    type Snapshot = HashMap<(Address, Address), u128>;

    fn snapshot(&self) -> Self::Snapshot {
        self.balances.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.balances = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_moves_balance() {
        let token = Address::from_low_u64_be(0xa0);
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);
        let mut ledger = InMemoryTokenLedger::new();
        ledger.mint(token, alice, 100);

        ledger.transfer(token, alice, bob, 40).unwrap();
        assert_eq!(ledger.balance_of(token, alice), 60);
        assert_eq!(ledger.balance_of(token, bob), 40);
        assert_eq!(ledger.total_of(token), 100);

        let err = ledger.transfer(token, bob, alice, 41).unwrap_err();
        assert_eq!(
            err,
            TokenLedgerError::InsufficientFunds {
                token,
                holder: bob,
                requested: 41,
                available: 40
            }
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let token = Address::from_low_u64_be(0xa0);
        let alice = Address::from_low_u64_be(1);
        let mut ledger = InMemoryTokenLedger::new();
        ledger.mint(token, alice, 100);

        let snapshot = ledger.snapshot();
        ledger.mint(token, alice, 5);
        ledger.restore(snapshot);
        assert_eq!(ledger.balance_of(token, alice), 100);
    }
}
