use primitive_types::H160;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account or token address on the host ledger.
pub type Address = H160;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub name: String,
}

impl Token {
    pub fn new(
        address: Address,
        symbol: impl Into<String>,
        decimals: u8,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            name: name.into(),
        }
    }
}

/// Ordered token pair. `token0` always sorts below `token1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    pub token0: Address,
    pub token1: Address,
}

impl TokenPair {
    /// Builds a pair from two distinct addresses, sorting them.
    ///
    /// Returns `None` when both addresses are equal.
    pub fn sorted(a: Address, b: Address) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                token0: a,
                token1: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                token0: b,
                token1: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Whether the pair is already in canonical order.
    pub fn is_ordered(&self) -> bool {
        self.token0 < self.token1
    }

    /// Returns `Some(true)` for token0, `Some(false)` for token1.
    pub fn side_of(&self, token: Address) -> Option<bool> {
        if token == self.token0 {
            Some(true)
        } else if token == self.token1 {
            Some(false)
        } else {
            None
        }
    }

    pub fn contains(&self, token: Address) -> bool {
        self.side_of(token).is_some()
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.token0, self.token1)
    }
}
