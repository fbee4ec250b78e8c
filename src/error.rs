use thiserror::Error;

#[derive(Debug, Error)]
pub enum HorserError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid horse color `{0}`")]
    InvalidColor(String),
    #[error("horse names must be between 1 and {max} characters")]
    InvalidName { max: usize },
    #[error("insufficient funds: balance is {balance}, price is {price}")]
    InsufficientFunds { balance: i64, price: i64 },
    #[error("not enough energy: {available} available, {required} required")]
    NotEnoughEnergy { available: i64, required: i64 },
    #[error("energy amounts must be positive, got {0}")]
    InvalidAmount(i64),
    #[error("horse {0} not found")]
    HorseNotFound(i64),
}
