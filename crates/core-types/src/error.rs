use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Price must not be negative, got {0}")]
    NegativePrice(Decimal),

    #[error("Price is not a finite number: {0}")]
    NonFinitePrice(f64),

    #[error("Price {0} cannot be represented as a decimal")]
    Unrepresentable(f64),
}
