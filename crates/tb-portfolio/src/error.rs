use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a prospective trade is refused admission to the trade log.
///
/// All variants are caller-correctable; none is worth retrying unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("price must be greater than zero")]
    InvalidPrice,

    #[error("invalid value for field '{field}'")]
    InvalidInput { field: &'static str },

    #[error("insufficient quantity of {symbol}: available {available}, requested {requested}")]
    InsufficientQuantity {
        symbol: String,
        available: Decimal,
        requested: Decimal,
    },
}

/// Malformed trade construction input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("unknown trade side '{0}' (expected buy | sell)")]
    UnknownSide(String),

    #[error("unknown asset type '{0}'")]
    UnknownAssetType(String),
}
