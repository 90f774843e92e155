//! Portfolio and position types.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;
use crate::error::TradeError;

/// A holding in a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ticker symbol
    pub ticker: String,
    /// Number of shares held (always positive; flat positions are removed)
    pub quantity: Decimal,
    /// Weighted-average acquisition price
    pub average_price: Decimal,
    /// Latest known market price
    pub current_price: Decimal,
    /// Sector label, when known
    #[serde(default)]
    pub sector: Option<String>,
}

impl Position {
    /// Create a position marked at its acquisition price.
    pub fn new(ticker: impl Into<String>, quantity: Decimal, average_price: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            average_price,
            current_price: average_price,
            sector: None,
        }
    }

    /// Set the current market price.
    pub fn with_current_price(mut self, price: Decimal) -> Self {
        self.current_price = price;
        self
    }

    /// Set the sector label.
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Market value (quantity * current_price).
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }

    /// Cost basis (quantity * average_price).
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_price
    }

    /// Unrealized profit/loss.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.market_value() - self.cost_basis()
    }

    /// Check if the position holds no shares.
    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }
}

/// Cash plus an ordered set of positions.
///
/// `total_value` is always derived, never stored, so the invariant
/// `total_value == cash_balance + Σ market_value` cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Portfolio identity
    pub id: String,
    /// Owner reference
    pub owner: String,
    /// Uninvested cash
    pub cash_balance: Decimal,
    /// Open positions, in acquisition order
    pub positions: Vec<Position>,
    /// Ledger version, bumped on every committed mutation
    #[serde(default)]
    pub version: u64,
}

impl Portfolio {
    /// Create an all-cash portfolio.
    pub fn new(id: impl Into<String>, owner: impl Into<String>, cash_balance: Decimal) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            cash_balance,
            positions: Vec::new(),
            version: 0,
        }
    }

    /// Add a position (builder style).
    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    /// Total market value of all positions.
    pub fn market_value(&self) -> Decimal {
        self.positions.iter().map(Position::market_value).sum()
    }

    /// Cash plus market value of all positions.
    pub fn total_value(&self) -> Decimal {
        self.cash_balance + self.market_value()
    }

    /// Get a position by ticker.
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    /// Quantity held for a ticker (zero when not held).
    pub fn held_quantity(&self, ticker: &str) -> Decimal {
        self.position(ticker)
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Tickers of all open positions.
    pub fn tickers(&self) -> Vec<&str> {
        self.positions.iter().map(|p| p.ticker.as_str()).collect()
    }

    /// Weight of a position against total value.
    pub fn weight_of(&self, ticker: &str) -> f64 {
        self.position(ticker)
            .map(|p| ratio(p.market_value(), self.total_value()))
            .unwrap_or(0.0)
    }

    /// Weight of cash against total value.
    pub fn cash_weight(&self) -> f64 {
        ratio(self.cash_balance, self.total_value())
    }

    /// Apply a trade in place.
    ///
    /// Validation happens before any field is touched, so on error the
    /// portfolio is unchanged; amounts that do not fit a decimal fail with
    /// [`TradeError::AmountOverflow`]. Buys update the weighted-average price
    /// and keep an existing position's mark; a new position is marked at the
    /// trade price. Sells leave the average price alone and drop flat
    /// positions.
    pub fn apply_trade(
        &mut self,
        side: Side,
        ticker: &str,
        quantity: Decimal,
        price: Decimal,
        sector: Option<String>,
    ) -> Result<Decimal, TradeError> {
        let overflow = || TradeError::AmountOverflow {
            ticker: ticker.to_string(),
            quantity,
            price,
        };
        let amount = quantity.checked_mul(price).ok_or_else(overflow)?;

        match side {
            Side::Buy => {
                if amount > self.cash_balance {
                    return Err(TradeError::InsufficientFunds {
                        required: amount,
                        available: self.cash_balance,
                    });
                }

                match self.positions.iter_mut().find(|p| p.ticker == ticker) {
                    Some(position) => {
                        let new_quantity = position
                            .quantity
                            .checked_add(quantity)
                            .ok_or_else(overflow)?;
                        let new_cost = position
                            .quantity
                            .checked_mul(position.average_price)
                            .and_then(|cost| cost.checked_add(amount))
                            .ok_or_else(overflow)?;
                        position.average_price = new_cost / new_quantity;
                        position.quantity = new_quantity;
                        if position.sector.is_none() {
                            position.sector = sector;
                        }
                    }
                    None => {
                        let mut position = Position::new(ticker, quantity, price);
                        position.sector = sector;
                        self.positions.push(position);
                    }
                }
                self.cash_balance -= amount;
            }
            Side::Sell => {
                let held = self.held_quantity(ticker);
                if quantity > held {
                    return Err(TradeError::InsufficientHoldings {
                        ticker: ticker.to_string(),
                        requested: quantity,
                        held,
                    });
                }
                let cash_balance = self.cash_balance.checked_add(amount).ok_or_else(overflow)?;

                if let Some(position) = self.positions.iter_mut().find(|p| p.ticker == ticker) {
                    position.quantity -= quantity;
                }
                self.positions.retain(|p| !p.is_flat());
                self.cash_balance = cash_balance;
            }
        }

        Ok(amount)
    }

    /// Render the portfolio with derived totals and weights.
    pub fn view(&self) -> PortfolioView {
        let total_value = self.total_value();
        let positions = self
            .positions
            .iter()
            .map(|p| PositionView {
                ticker: p.ticker.clone(),
                quantity: p.quantity,
                average_price: p.average_price,
                current_price: p.current_price,
                market_value: p.market_value(),
                unrealized_pnl: p.unrealized_pnl(),
                weight: ratio(p.market_value(), total_value),
                sector: p.sector.clone(),
            })
            .collect();

        PortfolioView {
            portfolio_id: self.id.clone(),
            cash_balance: self.cash_balance,
            total_value,
            cash_weight: ratio(self.cash_balance, total_value),
            positions,
        }
    }
}

/// Serializable portfolio view with derived values, as shown for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub portfolio_id: String,
    pub cash_balance: Decimal,
    pub total_value: Decimal,
    pub cash_weight: f64,
    pub positions: Vec<PositionView>,
}

/// A position inside a [`PortfolioView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub ticker: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    /// Market value minus cost basis at the current mark
    #[serde(default)]
    pub unrealized_pnl: Decimal,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

/// `numerator / denominator` as f64, zero when the denominator is not positive.
pub(crate) fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    if denominator <= Decimal::ZERO {
        return 0.0;
    }
    (numerator / denominator).to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn portfolio() -> Portfolio {
        Portfolio::new("p1", "alice", dec!(1000000))
            .with_position(Position::new("AAA", dec!(10), dec!(50000)).with_sector("Tech"))
    }

    #[test]
    fn test_total_value_invariant() {
        let portfolio = portfolio().with_position(
            Position::new("BBB", dec!(5), dec!(1000)).with_current_price(dec!(1200)),
        );
        assert_eq!(portfolio.market_value(), dec!(506000));
        assert_eq!(portfolio.total_value(), dec!(1506000));
    }

    #[test]
    fn test_buy_existing_updates_average_price() {
        let mut portfolio = portfolio();
        let amount = portfolio
            .apply_trade(Side::Buy, "AAA", dec!(10), dec!(60000), None)
            .unwrap();

        assert_eq!(amount, dec!(600000));
        assert_eq!(portfolio.cash_balance, dec!(400000));
        let position = portfolio.position("AAA").unwrap();
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.average_price, dec!(55000));
        assert_eq!(position.sector.as_deref(), Some("Tech"));
    }

    #[test]
    fn test_buy_insufficient_funds_leaves_portfolio_untouched() {
        let mut portfolio = portfolio();
        let before = portfolio.clone();

        let err = portfolio
            .apply_trade(Side::Buy, "BBB", dec!(100), dec!(20000), None)
            .unwrap_err();

        assert_eq!(
            err,
            TradeError::InsufficientFunds {
                required: dec!(2000000),
                available: dec!(1000000),
            }
        );
        assert_eq!(portfolio, before);
    }

    #[test]
    fn test_oversized_trade_is_an_error() {
        let mut portfolio = portfolio();
        let before = portfolio.clone();

        let err = portfolio
            .apply_trade(Side::Buy, "AAA", Decimal::MAX, dec!(2), None)
            .unwrap_err();

        assert!(matches!(err, TradeError::AmountOverflow { ref ticker, .. } if ticker == "AAA"));
        assert_eq!(portfolio, before);
    }

    #[test]
    fn test_sell_all_removes_position() {
        let mut portfolio = portfolio();
        portfolio
            .apply_trade(Side::Sell, "AAA", dec!(10), dec!(55000), None)
            .unwrap();

        assert!(portfolio.position("AAA").is_none());
        assert_eq!(portfolio.cash_balance, dec!(1550000));
    }

    #[test]
    fn test_sell_more_than_held() {
        let mut portfolio = portfolio();
        let err = portfolio
            .apply_trade(Side::Sell, "AAA", dec!(11), dec!(50000), None)
            .unwrap_err();

        assert!(matches!(err, TradeError::InsufficientHoldings { .. }));
        assert_eq!(portfolio.held_quantity("AAA"), dec!(10));
    }

    #[test]
    fn test_sell_unheld_ticker() {
        let mut portfolio = portfolio();
        let err = portfolio
            .apply_trade(Side::Sell, "ZZZ", dec!(1), dec!(10), None)
            .unwrap_err();

        assert_eq!(
            err,
            TradeError::InsufficientHoldings {
                ticker: "ZZZ".to_string(),
                requested: dec!(1),
                held: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_view_weights_sum_to_one() {
        let portfolio = portfolio()
            .with_position(Position::new("BBB", dec!(3), dec!(33333.33)));
        let view = portfolio.view();

        let sum: f64 = view.positions.iter().map(|p| p.weight).sum::<f64>() + view.cash_weight;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_reports_unrealized_pnl_at_mark() {
        let portfolio = Portfolio::new("p1", "alice", Decimal::ZERO).with_position(
            Position::new("AAA", dec!(10), dec!(50000)).with_current_price(dec!(56000)),
        );
        let view = portfolio.view();

        assert_eq!(view.positions[0].market_value, dec!(560000));
        assert_eq!(view.positions[0].unrealized_pnl, dec!(60000));
    }

    #[test]
    fn test_empty_portfolio_weights() {
        let portfolio = Portfolio::new("p0", "nobody", Decimal::ZERO);
        assert_eq!(portfolio.cash_weight(), 0.0);
        assert!(portfolio.view().positions.is_empty());
    }
}
