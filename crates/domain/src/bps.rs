use crate::error::MathError;
use crate::math::full_math::{Rounding, mul_div_u128};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Denominator of a basis-point fraction.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// A fraction expressed in basis points (1 bps = 0.01%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisPoints(pub u16);

impl BasisPoints {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(BPS_DENOMINATOR);

    pub fn new(bps: u16) -> Self {
        Self(bps)
    }

    /// Whether the value is at most 100%.
    pub fn is_valid(&self) -> bool {
        self.0 <= BPS_DENOMINATOR
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `floor(amount * bps / 10000)`.
    pub fn apply(&self, amount: u128) -> Result<u128, MathError> {
        mul_div_u128(
            amount,
            u128::from(self.0),
            u128::from(BPS_DENOMINATOR),
            Rounding::Down,
        )
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn to_percentage(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100)
    }
}

impl From<u16> for BasisPoints {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
