//! tb-portfolio
//!
//! Position & trade-validation engine:
//! - Trade history is the source of truth
//! - Weighted-average-cost accounting per symbol (no tax lots)
//! - Realized vs unrealized PnL
//! - Admission checks for new trades (no negative positions)
//! - Pure deterministic logic (no IO, no clock, no global state)
//!
//! All amounts are [`rust_decimal::Decimal`]; nothing here touches binary
//! floating point.

mod aggregator;
mod calculator;
mod error;
mod prices;
mod realized;
mod types;
mod validator;

pub mod ordering;

pub use aggregator::{FoldOutcome, PositionAggregator};
pub use calculator::{OversellPolicy, PortfolioCalculator};
pub use error::{TradeError, ValidationError};
pub use ordering::{group_by_symbol, sort_trades_chronological};
pub use prices::{prices, AsyncPriceSource, FallbackPrices, PriceMap, PriceSource};
pub use realized::RealizedGainsCalculator;
pub use types::{
    normalize_symbol, AssetType, AssetValuation, Oversell, PortfolioSnapshot, Position, Side,
    TradeRecord,
};
pub use validator::TradeValidator;

pub use rust_decimal::Decimal;
