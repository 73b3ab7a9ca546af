//! Portfolio command handlers.
//!
//! Covers `tb snapshot`, `tb realized` and `tb validate`. Each reads the full
//! trade log from disk and hands it to the engine unfiltered.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tb_portfolio::{
    PortfolioCalculator, RealizedGainsCalculator, Side, TradeRecord, TradeValidator,
};
use tracing::info;

use crate::load::{parse_decimal, parse_timestamp, read_prices, read_trades};

/// Execute `tb snapshot`: value open positions and print the snapshot as JSON.
pub fn snapshot(calc: &PortfolioCalculator, trades: &Path, prices: &Path) -> Result<()> {
    let history = read_trades(trades)?;
    let marks = read_prices(prices)?;

    let snap = calc.calculate(&history, &marks);
    info!(
        trades = history.len(),
        assets = snap.assets.len(),
        diagnostics = snap.diagnostics.len(),
        "snapshot computed"
    );

    let json = serde_json::to_string_pretty(&snap).context("serialize snapshot json failed")?;
    println!("{json}");
    Ok(())
}

/// Execute `tb realized`.
pub fn realized(trades: &Path, by_symbol: bool) -> Result<()> {
    let history = read_trades(trades)?;
    let calc = RealizedGainsCalculator::new();

    if by_symbol {
        for (symbol, gain) in calc.realized_by_symbol(&history) {
            println!("symbol={symbol} realized_gain={gain}");
        }
    }
    println!("realized_gain={}", calc.calculate_realized_gains(&history));
    Ok(())
}

/// Arguments for `tb validate` (one prospective trade).
pub struct ProspectiveTrade<'a> {
    pub symbol: &'a str,
    pub side: Side,
    pub price: &'a str,
    pub quantity: &'a str,
    pub at: Option<&'a str>,
}

/// Execute `tb validate`: check a prospective trade against the log.
///
/// Exits non-zero with the field-level reason on rejection. Never writes to
/// the log; appending is the caller's job.
pub fn validate(
    calc: &PortfolioCalculator,
    trades: &Path,
    trade: ProspectiveTrade<'_>,
) -> Result<()> {
    let history = read_trades(trades)?;

    let price = parse_decimal(trade.price).context("--price")?;
    let quantity = parse_decimal(trade.quantity).context("--qty")?;
    let timestamp = match trade.at {
        Some(s) => parse_timestamp(s).context("--at")?,
        None => Utc::now(),
    };
    let record = TradeRecord::new(trade.symbol, trade.side, price, quantity, timestamp)
        .context("--symbol")?;

    let positions = calc.positions(&history);
    TradeValidator::new()
        .validate(&record, &positions)
        .with_context(|| format!("validation_failed symbol={}", record.symbol))?;

    println!(
        "validation_ok=true symbol={} side={} quantity={}",
        record.symbol,
        record.side.as_str(),
        record.quantity
    );
    Ok(())
}
