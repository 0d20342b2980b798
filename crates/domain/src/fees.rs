use serde::{Deserialize, Serialize};

/// Swap fee tier of the underlying AMM.
///
/// `fee_pips` is expressed in hundredths of a basis point (3000 = 0.3%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub fee_pips: u32,
    pub tick_spacing: i32,
}

/// One million hundredths of a basis point.
pub const FEE_PIPS_DENOMINATOR: u32 = 1_000_000;

impl FeeTier {
    pub const LOW: Self = Self {
        fee_pips: 500,
        tick_spacing: 10,
    };
    pub const MEDIUM: Self = Self {
        fee_pips: 3000,
        tick_spacing: 60,
    };
    pub const HIGH: Self = Self {
        fee_pips: 10_000,
        tick_spacing: 200,
    };

    pub fn new(fee_pips: u32, tick_spacing: i32) -> Self {
        Self {
            fee_pips,
            tick_spacing,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fee_pips < FEE_PIPS_DENOMINATOR && self.tick_spacing > 0
    }
}

impl Default for FeeTier {
    fn default() -> Self {
        Self::MEDIUM
    }
}
