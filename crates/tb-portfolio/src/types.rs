use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TradeError;

/// BUY or SELL for trades.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl FromStr for Side {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Ok(Side::Buy),
            "sell" | "s" => Ok(Side::Sell),
            _ => Err(TradeError::UnknownSide(s.to_string())),
        }
    }
}

/// Instrument class of a trade. Metadata only.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Stock,
    Etf,
    Crypto,
    Fund,
    Other,
}

impl FromStr for AssetType {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "stock" => Ok(AssetType::Stock),
            "etf" => Ok(AssetType::Etf),
            "crypto" => Ok(AssetType::Crypto),
            "fund" => Ok(AssetType::Fund),
            "other" => Ok(AssetType::Other),
            _ => Err(TradeError::UnknownAssetType(s.to_string())),
        }
    }
}

/// A single executed trade (the accounting atom).
///
/// `symbol` is trimmed and upper-cased on construction. `price` and
/// `quantity` are NOT checked here: admission checks belong to
/// [`TradeValidator`](crate::TradeValidator), and historical records must be
/// representable even when they would no longer pass validation.
///
/// The engine only ever reads trades; it never mutates one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
    pub asset_type: AssetType,
    pub note: Option<String>,
    pub emotion: Option<String>,
}

impl TradeRecord {
    pub fn new<S: AsRef<str>>(
        symbol: S,
        side: Side,
        price: Decimal,
        quantity: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, TradeError> {
        let symbol = normalize_symbol(symbol.as_ref());
        if symbol.is_empty() {
            return Err(TradeError::EmptySymbol);
        }
        Ok(Self {
            symbol,
            side,
            price,
            quantity,
            timestamp,
            asset_type: AssetType::default(),
            note: None,
            emotion: None,
        })
    }

    pub fn with_asset_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = asset_type;
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_emotion<S: Into<String>>(mut self, emotion: S) -> Self {
        self.emotion = Some(emotion.into());
        self
    }
}

/// Canonical symbol form: trimmed, ASCII upper-case.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Derived position state for one symbol.
///
/// `quantity` is never negative. `avg_cost` and `cost_basis` are zero while
/// the position is flat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub cost_basis: Decimal,
}

impl Position {
    pub fn flat<S: Into<String>>(symbol: S) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// A sell that asked for more than was held at the time it executed.
///
/// Only possible in history admitted without validation. The aggregator
/// clamps the sell to `available` and records one of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oversell {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub requested: Decimal,
    pub available: Decimal,
}

/// Valuation of one open position at a given price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValuation {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub cost_basis: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    /// Unrealized: `market_value - cost_basis`.
    pub pnl: Decimal,
    /// `pnl / cost_basis` as a ratio (0.1 = +10%). Zero when avg cost is zero.
    pub pnl_percent: Decimal,
}

/// Output of one calculation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Open positions, ordered by symbol.
    pub assets: Vec<AssetValuation>,
    pub total_balance: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    /// Clamped oversells; populated only under [`OversellPolicy::Report`](crate::OversellPolicy::Report).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Oversell>,
}

impl PortfolioSnapshot {
    pub fn asset(&self, symbol: &str) -> Option<&AssetValuation> {
        let symbol = normalize_symbol(symbol);
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
