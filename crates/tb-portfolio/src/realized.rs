//! Realized gain over the full history, closed round trips included.
//!
//! [`PortfolioCalculator`](crate::PortfolioCalculator) only reports open
//! positions. A symbol bought and fully sold still carries realized gain, so
//! this runs the same per-symbol fold and keeps the `realized` output instead.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    aggregator::PositionAggregator, calculator::saturating_total, ordering::group_by_symbol,
    TradeRecord,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct RealizedGainsCalculator;

impl RealizedGainsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Σ over sells of `(sell_price - avg_cost_at_sale) * sold_qty`.
    pub fn calculate_realized_gains(&self, trades: &[TradeRecord]) -> Decimal {
        saturating_total("realized_gain", self.realized_by_symbol(trades).into_values())
    }

    /// Realized gain per symbol. Symbols that never sold appear with zero.
    pub fn realized_by_symbol(&self, trades: &[TradeRecord]) -> BTreeMap<String, Decimal> {
        group_by_symbol(trades)
            .into_iter()
            .map(|(symbol, group)| {
                let out = PositionAggregator::fold_ordered(symbol, group);
                (symbol.to_string(), out.realized)
            })
            .collect()
    }
}
