//! Trade ordering policy.
//!
//! Average cost depends on the order buys and sells are applied in, so every
//! fold runs over trades in a canonical order:
//!
//! - ascending `timestamp`;
//! - ties keep their input order (stable sort).
//!
//! Only the order *within* one symbol matters. Trades for different symbols
//! never interact, so the relative interleaving of symbols in the input has
//! no effect on any position.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::TradeRecord;

/// Sort `trades` into canonical order **in place**.
///
/// Stable: trades with equal timestamps keep their relative order. Works on
/// owned records and on borrowed views alike.
pub fn sort_trades_chronological<T: Borrow<TradeRecord>>(trades: &mut [T]) {
    trades.sort_by_key(|t| <T as Borrow<TradeRecord>>::borrow(t).timestamp);
}

/// Group trades by symbol; each group is in canonical order.
///
/// Borrowing variant used by the calculators so the caller's history is
/// never copied or reordered.
pub fn group_by_symbol<'a, I>(trades: I) -> BTreeMap<&'a str, Vec<&'a TradeRecord>>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut groups: BTreeMap<&'a str, Vec<&'a TradeRecord>> = BTreeMap::new();
    for t in trades {
        groups.entry(t.symbol.as_str()).or_default().push(t);
    }
    for group in groups.values_mut() {
        sort_trades_chronological(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, side: Side, qty: rust_decimal::Decimal, secs: i64) -> TradeRecord {
        TradeRecord::new(
            symbol,
            side,
            dec!(100),
            qty,
            Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn sort_is_stable_on_tied_timestamps() {
        let mut trades = vec![
            trade("AAPL", Side::Sell, dec!(2), 5),
            trade("AAPL", Side::Buy, dec!(1), 0),
            trade("AAPL", Side::Buy, dec!(3), 5),
        ];
        sort_trades_chronological(&mut trades);
        assert_eq!(trades[0].quantity, dec!(1));
        // tie at t=5: original order was Sell(2) then Buy(3)
        assert_eq!(trades[1].side, Side::Sell);
        assert_eq!(trades[2].side, Side::Buy);
    }

    #[test]
    fn groups_are_keyed_by_symbol_and_sorted() {
        let trades = vec![
            trade("MSFT", Side::Buy, dec!(1), 9),
            trade("AAPL", Side::Buy, dec!(2), 3),
            trade("MSFT", Side::Buy, dec!(4), 1),
        ];
        let groups = group_by_symbol(&trades);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
        let msft: Vec<_> = groups["MSFT"].iter().map(|t| t.quantity).collect();
        assert_eq!(msft, vec![dec!(4), dec!(1)]);
    }

    #[test]
    fn groups_keep_input_order_on_tied_timestamps() {
        let trades = vec![
            trade("AAPL", Side::Sell, dec!(2), 5),
            trade("MSFT", Side::Buy, dec!(9), 5),
            trade("AAPL", Side::Buy, dec!(3), 5),
            trade("AAPL", Side::Buy, dec!(1), 0),
        ];
        let groups = group_by_symbol(&trades);
        let aapl: Vec<_> = groups["AAPL"].iter().map(|t| (t.side, t.quantity)).collect();
        assert_eq!(
            aapl,
            vec![(Side::Buy, dec!(1)), (Side::Sell, dec!(2)), (Side::Buy, dec!(3))]
        );
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let trades: Vec<TradeRecord> = Vec::new();
        let groups = group_by_symbol(&trades);
        assert!(groups.is_empty());
    }
}
