//! Error types for the strategy engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Missing price: {0}")]
    MissingPrice(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StrategyResult<T> = Result<T, StrategyError>;

impl StrategyError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn missing_price(msg: impl Into<String>) -> Self {
        Self::MissingPrice(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateInput(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for StrategyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
