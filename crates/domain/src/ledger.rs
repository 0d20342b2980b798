//! Interface of the underlying token ledger and transactional snapshots.

use crate::token::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenLedgerError {
    #[error("{holder:?} holds {available} of {token:?}, {requested} requested")]
    InsufficientFunds {
        token: Address,
        holder: Address,
        requested: u128,
        available: u128,
    },

    #[error("balance overflow for {holder:?}")]
    BalanceOverflow { holder: Address },
}

/// Balances of the two underlying tokens, keyed by holder.
pub trait TokenLedger {
    fn balance_of(&self, token: Address, holder: Address) -> u128;

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenLedgerError>;
}

/// State that can be captured and restored as a unit, modelling the host
/// ledger's all-or-nothing transactions.
pub trait Transactional {
    type Snapshot;

    fn snapshot(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: Self::Snapshot);
}
