//! Weighted-average-cost position folding for a single symbol.
//!
//! Rules (applied in canonical order, see [`ordering`](crate::ordering)):
//! - Buy `(p, q)`:
//!   - cost_basis += p*q
//!   - quantity   += q
//!   - avg_cost    = cost_basis / quantity
//! - Sell `(p, q)`:
//!   - effective   = min(q, quantity)   (clamped; never goes negative)
//!   - realized   += (p - avg_cost) * effective
//!   - quantity   -= effective
//!   - cost_basis  = quantity * avg_cost  (avg_cost itself untouched)
//!   - flat => avg_cost = cost_basis = 0, so a later buy starts fresh
//!
//! A buy whose basis would overflow `Decimal` is skipped with a warning;
//! realized gain saturates instead. Folding never panics.
//!
//! Pure logic: no IO, no clock, no shared state.

use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    ordering::sort_trades_chronological,
    types::{Oversell, Position, Side, TradeRecord},
};

/// Result of folding one symbol's history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoldOutcome {
    pub position: Position,
    /// Realized gain accumulated over every sell in the history.
    pub realized: Decimal,
    /// Sells that were clamped because they exceeded the held quantity.
    pub oversells: Vec<Oversell>,
}

/// Running average-cost accumulator for one symbol.
///
/// Feed trades with [`apply`](Self::apply) in canonical order, then call
/// [`finish`](Self::finish). [`fold`](Self::fold) does both and sorts first.
#[derive(Clone, Debug)]
pub struct PositionAggregator {
    position: Position,
    realized: Decimal,
    oversells: Vec<Oversell>,
}

impl PositionAggregator {
    pub fn new<S: Into<String>>(symbol: S) -> Self {
        Self {
            position: Position::flat(symbol),
            realized: Decimal::ZERO,
            oversells: Vec::new(),
        }
    }

    /// Fold a symbol's trades into a position. Input order does not need to
    /// be chronological; ties on timestamp keep input order.
    pub fn fold<'a, I>(symbol: &str, trades: I) -> FoldOutcome
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        let mut ordered: Vec<&TradeRecord> = trades.into_iter().collect();
        sort_trades_chronological(&mut ordered);
        Self::fold_ordered(symbol, ordered)
    }

    /// Fold trades that are already in canonical order.
    pub(crate) fn fold_ordered<'a, I>(symbol: &str, trades: I) -> FoldOutcome
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        let mut agg = Self::new(symbol);
        for t in trades {
            agg.apply(t);
        }
        agg.finish()
    }

    /// Apply one trade.
    pub fn apply(&mut self, trade: &TradeRecord) {
        debug_assert_eq!(
            trade.symbol, self.position.symbol,
            "PositionAggregator fed a trade for another symbol"
        );

        // Non-positive quantities never pass validation. Old history might
        // still carry one; applying it could drive quantity negative.
        if trade.quantity <= Decimal::ZERO {
            warn!(
                symbol = %trade.symbol,
                quantity = %trade.quantity,
                timestamp = %trade.timestamp,
                "skipping trade with non-positive quantity"
            );
            return;
        }

        match trade.side {
            Side::Buy => self.buy(trade),
            Side::Sell => self.sell(trade),
        }
    }

    fn buy(&mut self, trade: &TradeRecord) {
        let pos = &mut self.position;
        // All three must fit before anything is committed.
        let next = trade
            .price
            .checked_mul(trade.quantity)
            .and_then(|notional| pos.cost_basis.checked_add(notional))
            .and_then(|basis| {
                let qty = pos.quantity.checked_add(trade.quantity)?;
                let avg = basis.checked_div(qty)?;
                Some((basis, qty, avg))
            });

        match next {
            Some((basis, qty, avg)) => {
                pos.cost_basis = basis;
                pos.quantity = qty;
                pos.avg_cost = avg;
            }
            None => warn!(
                symbol = %trade.symbol,
                price = %trade.price,
                quantity = %trade.quantity,
                timestamp = %trade.timestamp,
                "skipping buy whose cost basis overflows Decimal"
            ),
        }
    }

    fn sell(&mut self, trade: &TradeRecord) {
        let pos = &mut self.position;
        let available = pos.quantity;
        let effective = trade.quantity.min(available);

        if trade.quantity > available {
            warn!(
                symbol = %trade.symbol,
                requested = %trade.quantity,
                available = %available,
                timestamp = %trade.timestamp,
                "sell exceeds held quantity; clamping"
            );
            self.oversells.push(Oversell {
                symbol: trade.symbol.clone(),
                timestamp: trade.timestamp,
                requested: trade.quantity,
                available,
            });
        }

        let gain = trade
            .price
            .checked_sub(pos.avg_cost)
            .and_then(|per_unit| per_unit.checked_mul(effective))
            .and_then(|g| self.realized.checked_add(g));
        self.realized = match gain {
            Some(total) => total,
            None => {
                warn!(
                    symbol = %trade.symbol,
                    price = %trade.price,
                    timestamp = %trade.timestamp,
                    "realized gain overflows Decimal; saturating"
                );
                let per_unit = trade.price.saturating_sub(pos.avg_cost);
                self.realized.saturating_add(per_unit.saturating_mul(effective))
            }
        };
        pos.quantity -= effective;

        if pos.quantity.is_zero() {
            pos.avg_cost = Decimal::ZERO;
            pos.cost_basis = Decimal::ZERO;
        } else {
            // not above the basis held before the sell, up to avg_cost rounding
            pos.cost_basis = pos.quantity.saturating_mul(pos.avg_cost);
        }
    }

    /// Current position (flat positions included).
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn realized(&self) -> Decimal {
        self.realized
    }

    pub fn finish(self) -> FoldOutcome {
        FoldOutcome {
            position: self.position,
            realized: self.realized,
            oversells: self.oversells,
        }
    }
}
