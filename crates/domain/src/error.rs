use thiserror::Error;

/// Errors raised by the fixed-point math routines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("tick {0} out of bounds")]
    TickOutOfBounds(i32),

    #[error("sqrt price {0} out of bounds")]
    SqrtPriceOutOfBounds(String),

    #[error("price must be positive")]
    NonPositivePrice,
}
