pub mod full_math;
pub mod liquidity_amounts;
pub mod price_tick;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;

pub use full_math::Rounding;
pub use tick_math::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, Q96};
