//! Admission checks for a prospective trade.
//!
//! Call once per new trade, before it is appended to the trade log. The
//! position map is read only; nothing is mutated on either outcome.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    calculator::open_positions, error::ValidationError, types::normalize_symbol, Position, Side,
    TradeRecord,
};

/// Stateless trade validator.
#[derive(Clone, Copy, Debug, Default)]
pub struct TradeValidator;

impl TradeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check `trade` against the current open positions.
    ///
    /// Order of checks: price, quantity, symbol, representable notional,
    /// then (sells only) available quantity. The first failure wins.
    ///
    /// A trade whose `price * quantity` does not fit in a `Decimal`, or a buy
    /// whose resulting cost basis or average cost would not, is refused as an
    /// invalid quantity.
    pub fn validate(
        &self,
        trade: &TradeRecord,
        positions: &BTreeMap<String, Position>,
    ) -> Result<(), ValidationError> {
        if trade.price <= Decimal::ZERO {
            return Err(ValidationError::InvalidPrice);
        }
        if trade.quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput { field: "quantity" });
        }
        let symbol = normalize_symbol(&trade.symbol);
        if symbol.is_empty() {
            return Err(ValidationError::InvalidInput { field: "symbol" });
        }

        let held = positions.get(&symbol);
        let Some(notional) = trade.price.checked_mul(trade.quantity) else {
            return Err(ValidationError::InvalidInput { field: "quantity" });
        };
        if trade.side == Side::Buy {
            let basis = held.map(|p| p.cost_basis).unwrap_or(Decimal::ZERO);
            let qty = held.map(|p| p.quantity).unwrap_or(Decimal::ZERO);
            let avg = basis
                .checked_add(notional)
                .zip(qty.checked_add(trade.quantity))
                .and_then(|(b, q)| b.checked_div(q));
            if avg.is_none() {
                return Err(ValidationError::InvalidInput { field: "quantity" });
            }
        }

        if trade.side == Side::Sell {
            let available = held.map(|p| p.quantity).unwrap_or(Decimal::ZERO);
            if trade.quantity > available {
                return Err(ValidationError::InsufficientQuantity {
                    symbol,
                    available,
                    requested: trade.quantity,
                });
            }
        }

        Ok(())
    }

    /// Validate against positions derived from `history`.
    ///
    /// O(history) per call; callers validating many trades against the same
    /// history should build the map once with
    /// [`PortfolioCalculator::positions`](crate::PortfolioCalculator::positions).
    pub fn validate_against_history(
        &self,
        trade: &TradeRecord,
        history: &[TradeRecord],
    ) -> Result<(), ValidationError> {
        let positions = open_positions(history);
        self.validate(trade, &positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade(side: Side, qty: Decimal, price: Decimal) -> TradeRecord {
        TradeRecord::new("AAPL", side, price, qty, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .unwrap()
    }

    fn held(qty: Decimal) -> BTreeMap<String, Position> {
        let mut m = BTreeMap::new();
        m.insert(
            "AAPL".to_string(),
            Position {
                symbol: "AAPL".to_string(),
                quantity: qty,
                avg_cost: dec!(150),
                cost_basis: qty * dec!(150),
            },
        );
        m
    }

    #[test]
    fn rejects_zero_price() {
        let err = TradeValidator.validate(&trade(Side::Buy, dec!(1), dec!(0)), &BTreeMap::new());
        assert_eq!(err, Err(ValidationError::InvalidPrice));
    }

    #[test]
    fn rejects_negative_price() {
        let err = TradeValidator.validate(&trade(Side::Buy, dec!(1), dec!(-1)), &BTreeMap::new());
        assert_eq!(err, Err(ValidationError::InvalidPrice));
    }

    #[test]
    fn rejects_zero_quantity() {
        let err = TradeValidator.validate(&trade(Side::Buy, dec!(0), dec!(10)), &BTreeMap::new());
        assert_eq!(err, Err(ValidationError::InvalidInput { field: "quantity" }));
    }

    #[test]
    fn price_is_checked_before_quantity() {
        let err = TradeValidator.validate(&trade(Side::Buy, dec!(0), dec!(0)), &BTreeMap::new());
        assert_eq!(err, Err(ValidationError::InvalidPrice));
    }

    #[test]
    fn rejects_blank_symbol_on_hand_built_record() {
        let mut t = trade(Side::Buy, dec!(1), dec!(10));
        t.symbol = "   ".to_string();
        let err = TradeValidator.validate(&t, &BTreeMap::new());
        assert_eq!(err, Err(ValidationError::InvalidInput { field: "symbol" }));
    }

    #[test]
    fn buy_needs_no_position() {
        assert!(TradeValidator
            .validate(&trade(Side::Buy, dec!(5), dec!(10)), &BTreeMap::new())
            .is_ok());
    }

    #[test]
    fn oversell_reports_available_and_requested() {
        let err = TradeValidator.validate(&trade(Side::Sell, dec!(15), dec!(160)), &held(dec!(10)));
        assert_eq!(
            err,
            Err(ValidationError::InsufficientQuantity {
                symbol: "AAPL".to_string(),
                available: dec!(10),
                requested: dec!(15),
            })
        );
    }

    #[test]
    fn sell_without_position_has_zero_available() {
        let err = TradeValidator.validate(&trade(Side::Sell, dec!(1), dec!(160)), &BTreeMap::new());
        assert!(matches!(
            err,
            Err(ValidationError::InsufficientQuantity { available, .. }) if available.is_zero()
        ));
    }

    #[test]
    fn selling_exactly_the_held_quantity_is_allowed() {
        let positions = held(dec!(10));
        assert!(TradeValidator
            .validate(&trade(Side::Sell, dec!(10), dec!(160)), &positions)
            .is_ok());
        // not mutated
        assert_eq!(positions["AAPL"].quantity, dec!(10));
    }

    #[test]
    fn rejects_notional_that_overflows() {
        let huge = Decimal::from(1_000_000_000_000_000_i64);
        let buy = trade(Side::Buy, huge, huge);
        let err = TradeValidator.validate(&buy, &BTreeMap::new());
        assert_eq!(err, Err(ValidationError::InvalidInput { field: "quantity" }));

        // the refused trade would have been the one to break valuation
        let snap = crate::PortfolioCalculator::new()
            .calculate(&[buy], &crate::prices([("AAPL", Decimal::ONE)]));
        assert!(snap.is_empty());
    }

    #[test]
    fn rejects_buy_that_would_overflow_cost_basis() {
        let mut positions = held(dec!(1));
        positions.get_mut("AAPL").unwrap().cost_basis = Decimal::MAX - dec!(10);
        let err = TradeValidator.validate(&trade(Side::Buy, dec!(2), dec!(10)), &positions);
        assert_eq!(err, Err(ValidationError::InvalidInput { field: "quantity" }));
        assert!(TradeValidator
            .validate(&trade(Side::Buy, dec!(1), dec!(10)), &positions)
            .is_ok());
    }

    #[test]
    fn validates_against_derived_history() {
        let history = vec![trade(Side::Buy, dec!(10), dec!(150))];
        assert!(TradeValidator
            .validate_against_history(&trade(Side::Sell, dec!(10), dec!(160)), &history)
            .is_ok());
        assert!(TradeValidator
            .validate_against_history(&trade(Side::Sell, dec!(11), dec!(160)), &history)
            .is_err());
    }

    #[test]
    fn error_messages_are_field_level() {
        assert_eq!(
            ValidationError::InvalidInput { field: "quantity" }.to_string(),
            "invalid value for field 'quantity'"
        );
        assert_eq!(
            ValidationError::InsufficientQuantity {
                symbol: "AAPL".into(),
                available: dec!(10),
                requested: dec!(15),
            }
            .to_string(),
            "insufficient quantity of AAPL: available 10, requested 15"
        );
    }
}
