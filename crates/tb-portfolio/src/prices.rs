//! Price lookup seam.
//!
//! The engine never fetches quotes itself. Callers inject a [`PriceSource`]
//! (sync) or an [`AsyncPriceSource`] (e.g. a network-backed quote service).
//! Either is queried exactly once per open symbol per calculation.
//!
//! Timeouts and fallbacks are the caller's concern. [`FallbackPrices`] covers
//! the common case of "use the live quote if there is one, else the last
//! known price".

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use crate::types::normalize_symbol;

/// Canonical price map type (symbol -> price).
pub type PriceMap = BTreeMap<String, Decimal>;

/// Helper to build a PriceMap with minimal boilerplate. Symbols are
/// normalized the same way [`TradeRecord`](crate::TradeRecord) symbols are.
pub fn prices<I, S>(items: I) -> PriceMap
where
    I: IntoIterator<Item = (S, Decimal)>,
    S: AsRef<str>,
{
    let mut m = PriceMap::new();
    for (sym, px) in items {
        m.insert(normalize_symbol(sym.as_ref()), px);
    }
    m
}

/// Synchronous price lookup.
pub trait PriceSource {
    fn price_of(&self, symbol: &str) -> Decimal;
}

impl<F> PriceSource for F
where
    F: Fn(&str) -> Decimal,
{
    fn price_of(&self, symbol: &str) -> Decimal {
        self(symbol)
    }
}

/// Missing symbols price at zero (and are logged).
impl PriceSource for PriceMap {
    fn price_of(&self, symbol: &str) -> Decimal {
        lookup_or_zero(self, symbol)
    }
}

/// Asynchronous price lookup.
#[async_trait]
pub trait AsyncPriceSource: Send + Sync {
    async fn price_of(&self, symbol: &str) -> Decimal;
}

#[async_trait]
impl AsyncPriceSource for PriceMap {
    async fn price_of(&self, symbol: &str) -> Decimal {
        lookup_or_zero(self, symbol)
    }
}

fn lookup_or_zero(map: &PriceMap, symbol: &str) -> Decimal {
    match map.get(symbol) {
        Some(px) => *px,
        None => {
            warn!(symbol, "no price for open position; valuing at zero");
            Decimal::ZERO
        }
    }
}

/// Live lookup with a last-known-price fallback.
///
/// `live` returns `None` when no fresh quote is available (failed, stale,
/// timed out: the caller decides). The fallback map is consulted next; a
/// symbol missing from both prices at zero.
pub struct FallbackPrices<F> {
    live: F,
    last_known: PriceMap,
}

impl<F> FallbackPrices<F>
where
    F: Fn(&str) -> Option<Decimal>,
{
    pub fn new(live: F, last_known: PriceMap) -> Self {
        Self { live, last_known }
    }
}

impl<F> PriceSource for FallbackPrices<F>
where
    F: Fn(&str) -> Option<Decimal>,
{
    fn price_of(&self, symbol: &str) -> Decimal {
        if let Some(px) = (self.live)(symbol) {
            return px;
        }
        warn!(symbol, "live price unavailable; using last known");
        lookup_or_zero(&self.last_known, symbol)
    }
}
