//! Portfolio valuation over the full trade history.
//!
//! `calculate` is a pure function of `(trades, prices)`:
//! 1. group trades by symbol (chronological within each group)
//! 2. fold each group with [`PositionAggregator`]
//! 3. drop flat positions
//! 4. value what is left at `prices.price_of(symbol)`
//! 5. total it up
//!
//! There is no date filtering. Average cost depends on every historical buy,
//! so dropping old trades silently corrupts it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    aggregator::PositionAggregator,
    ordering::group_by_symbol,
    prices::{AsyncPriceSource, PriceSource},
    types::{AssetValuation, Oversell, PortfolioSnapshot, Position, TradeRecord},
};

/// What to surface when history contains a sell larger than the holding.
///
/// Both policies clamp the sell and log a warning; neither fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversellPolicy {
    /// Log only.
    #[default]
    Clamp,
    /// Log and attach each clamped sell to [`PortfolioSnapshot::diagnostics`].
    Report,
}

/// Stateless portfolio calculator. Construct one and pass it where needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortfolioCalculator {
    oversell_policy: OversellPolicy,
}

impl PortfolioCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oversell_policy(oversell_policy: OversellPolicy) -> Self {
        Self { oversell_policy }
    }

    pub fn oversell_policy(&self) -> OversellPolicy {
        self.oversell_policy
    }

    /// Open positions keyed by symbol. This is the context map
    /// [`TradeValidator::validate`](crate::TradeValidator::validate) expects.
    pub fn positions(&self, trades: &[TradeRecord]) -> BTreeMap<String, Position> {
        open_positions(trades)
    }

    /// Value the portfolio with a synchronous price source.
    ///
    /// `prices` is called once per open symbol, in symbol order.
    pub fn calculate<P>(&self, trades: &[TradeRecord], prices: &P) -> PortfolioSnapshot
    where
        P: PriceSource + ?Sized,
    {
        let (open, oversells) = fold_all(trades);
        let assets = open
            .into_iter()
            .map(|pos| {
                let px = prices.price_of(&pos.symbol);
                value(pos, px)
            })
            .collect();
        self.assemble(trades.len(), assets, oversells)
    }

    /// Value the portfolio with an asynchronous price source.
    ///
    /// Lookups are awaited one at a time in symbol order. The engine sets no
    /// timeout: a source that can hang must bound itself.
    pub async fn calculate_async<P>(&self, trades: &[TradeRecord], prices: &P) -> PortfolioSnapshot
    where
        P: AsyncPriceSource + ?Sized,
    {
        let (open, oversells) = fold_all(trades);
        let mut assets = Vec::with_capacity(open.len());
        for pos in open {
            let px = prices.price_of(&pos.symbol).await;
            assets.push(value(pos, px));
        }
        self.assemble(trades.len(), assets, oversells)
    }

    fn assemble(
        &self,
        trade_count: usize,
        assets: Vec<AssetValuation>,
        oversells: Vec<Oversell>,
    ) -> PortfolioSnapshot {
        let total_balance = saturating_total("total_balance", assets.iter().map(|a| a.market_value));
        let total_cost = saturating_total("total_cost", assets.iter().map(|a| a.cost_basis));

        let diagnostics = match self.oversell_policy {
            OversellPolicy::Clamp => Vec::new(),
            OversellPolicy::Report => oversells,
        };

        debug!(
            trades = trade_count,
            open_positions = assets.len(),
            total_balance = %total_balance,
            total_cost = %total_cost,
            "portfolio calculated"
        );

        PortfolioSnapshot {
            assets,
            total_balance,
            total_cost,
            total_pnl: total_balance.saturating_sub(total_cost),
            diagnostics,
        }
    }
}

/// Fold every symbol; return open positions (symbol order) and all clamped sells.
fn fold_all(trades: &[TradeRecord]) -> (Vec<Position>, Vec<Oversell>) {
    let mut open = Vec::new();
    let mut oversells = Vec::new();
    for (symbol, group) in group_by_symbol(trades) {
        let out = PositionAggregator::fold_ordered(symbol, group);
        oversells.extend(out.oversells);
        if !out.position.is_flat() {
            open.push(out.position);
        }
    }
    (open, oversells)
}

pub(crate) fn open_positions(trades: &[TradeRecord]) -> BTreeMap<String, Position> {
    let (open, _) = fold_all(trades);
    open.into_iter().map(|p| (p.symbol.clone(), p)).collect()
}

/// Sum that pins to `Decimal::MAX`/`MIN` instead of panicking.
pub(crate) fn saturating_total<I>(what: &str, values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let mut total = Decimal::ZERO;
    let mut saturated = false;
    for v in values {
        total = match total.checked_add(v) {
            Some(t) => t,
            None => {
                saturated = true;
                total.saturating_add(v)
            }
        };
    }
    if saturated {
        warn!(what, total = %total, "sum overflows Decimal; saturated");
    }
    total
}

fn value(pos: Position, current_price: Decimal) -> AssetValuation {
    let market_value = pos.quantity.checked_mul(current_price).unwrap_or_else(|| {
        warn!(
            symbol = %pos.symbol,
            quantity = %pos.quantity,
            current_price = %current_price,
            "market value overflows Decimal; saturating"
        );
        pos.quantity.saturating_mul(current_price)
    });
    let pnl = market_value.saturating_sub(pos.cost_basis);
    let pnl_percent = if pos.avg_cost.is_zero() {
        Decimal::ZERO
    } else {
        pnl.checked_div(pos.cost_basis).unwrap_or(Decimal::ZERO)
    };
    AssetValuation {
        symbol: pos.symbol,
        quantity: pos.quantity,
        avg_cost: pos.avg_cost,
        cost_basis: pos.cost_basis,
        current_price,
        market_value,
        pnl,
        pnl_percent,
    }
}
