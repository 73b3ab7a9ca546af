//! Trade-log and price-file readers.
//!
//! The engine itself never touches the filesystem; these readers exist so the
//! CLI can drive it. Format is chosen by extension: `.json` is JSON,
//! anything else is CSV with a header row.
//!
//! Decimal fields are read as text and parsed with `Decimal::from_str`, so
//! no value ever passes through `f64`. In JSON, quote them (`"0.1"`).

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tb_portfolio::{prices, AssetType, PriceMap, Side, TradeRecord};

/// One trade-log row, before normalization.
#[derive(Debug, Clone, Deserialize)]
struct TradeRow {
    symbol: String,
    side: String,
    price: String,
    quantity: String,
    timestamp: String,
    #[serde(default)]
    asset_type: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    emotion: Option<String>,
}

impl TradeRow {
    fn into_record(self, row: usize) -> Result<TradeRecord> {
        let side = Side::from_str(&self.side).with_context(|| format!("row {row}: side"))?;
        let price = parse_decimal(&self.price).with_context(|| format!("row {row}: price"))?;
        let quantity =
            parse_decimal(&self.quantity).with_context(|| format!("row {row}: quantity"))?;
        let timestamp =
            parse_timestamp(&self.timestamp).with_context(|| format!("row {row}: timestamp"))?;

        let mut rec = TradeRecord::new(&self.symbol, side, price, quantity, timestamp)
            .with_context(|| format!("row {row}: symbol"))?;
        if let Some(at) = self.asset_type.as_deref() {
            rec = rec.with_asset_type(
                AssetType::from_str(at).with_context(|| format!("row {row}: asset_type"))?,
            );
        }
        if let Some(note) = self.note.filter(|s| !s.trim().is_empty()) {
            rec = rec.with_note(note);
        }
        if let Some(emotion) = self.emotion.filter(|s| !s.trim().is_empty()) {
            rec = rec.with_emotion(emotion);
        }
        Ok(rec)
    }
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim()).with_context(|| format!("not a decimal: '{s}'"))
}

/// RFC 3339 (`2024-01-02T14:30:00Z`) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("not an RFC 3339 timestamp or date: '{s}'"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("no midnight on {date}"))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

pub fn read_trades(path: &Path) -> Result<Vec<TradeRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read trade log: {}", path.display()))?;
    let trades = if is_json(path) {
        trades_from_json(&raw)
    } else {
        trades_from_csv(&raw)
    };
    trades.with_context(|| format!("invalid trade log: {}", path.display()))
}

pub fn trades_from_csv(src: &str) -> Result<Vec<TradeRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<TradeRow>().enumerate() {
        // 1-based data rows; header is row 0
        let row_num = i + 1;
        let row = row.with_context(|| format!("row {row_num}: malformed csv record"))?;
        out.push(row.into_record(row_num)?);
    }
    Ok(out)
}

pub fn trades_from_json(src: &str) -> Result<Vec<TradeRecord>> {
    let rows: Vec<TradeRow> = serde_json::from_str(src).context("expected a JSON array of trades")?;
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| r.into_record(i + 1))
        .collect()
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    symbol: String,
    price: String,
}

pub fn read_prices(path: &Path) -> Result<PriceMap> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read price file: {}", path.display()))?;
    let marks = if is_json(path) {
        prices_from_json(&raw)
    } else {
        prices_from_csv(&raw)
    };
    marks.with_context(|| format!("invalid price file: {}", path.display()))
}

pub fn prices_from_csv(src: &str) -> Result<PriceMap> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());
    let mut items = Vec::new();
    for (i, row) in rdr.deserialize::<PriceRow>().enumerate() {
        let row = row.with_context(|| format!("row {}: malformed csv record", i + 1))?;
        let px = parse_decimal(&row.price).with_context(|| format!("row {}: price", i + 1))?;
        items.push((row.symbol, px));
    }
    Ok(prices(items))
}

/// `{"AAPL": "160.00", "MSFT": "410"}`
pub fn prices_from_json(src: &str) -> Result<PriceMap> {
    let raw: std::collections::BTreeMap<String, String> =
        serde_json::from_str(src).context("expected a JSON object of symbol -> price")?;
    let mut items = Vec::with_capacity(raw.len());
    for (sym, px) in raw {
        let px = parse_decimal(&px).with_context(|| format!("price for {sym}"))?;
        items.push((sym, px));
    }
    Ok(prices(items))
}
