//! Trade proposal builder.

use advisor_core::error::ProposalError;
use advisor_core::traits::MarketData;
use advisor_core::types::{OrderKind, ProposalModifications, TradeProposal, TradeRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Normalizes trade requests into pending proposals.
pub struct ProposalBuilder {
    market: Arc<dyn MarketData>,
}

impl ProposalBuilder {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    /// Build a pending proposal from a request.
    ///
    /// A missing or zero price is resolved from market data and the proposal
    /// is a market order; a supplied price makes it a limit order.
    pub async fn build(&self, request: &TradeRequest) -> Result<TradeProposal, ProposalError> {
        let ticker = normalize_ticker(&request.ticker)?;
        validate_quantity(request.quantity)?;

        let (price, order_kind) = match request.price {
            Some(price) if price < Decimal::ZERO => return Err(ProposalError::InvalidPrice(price)),
            Some(price) if price > Decimal::ZERO => (price, OrderKind::Limit),
            _ => (self.resolve_price(&ticker).await?, OrderKind::Market),
        };

        let proposal =
            TradeProposal::new(ticker, request.side, request.quantity, price, order_kind)?;
        debug!(
            proposal_id = %proposal.id,
            ticker = %proposal.ticker,
            side = %proposal.side,
            total = %proposal.total_amount,
            "Proposal built"
        );
        Ok(proposal)
    }

    /// Build the proposal that replaces `proposal` after a reviewer edit.
    ///
    /// Unmodified fields carry over. The result has a new id and records the
    /// proposal it supersedes.
    pub async fn amend(
        &self,
        proposal: &TradeProposal,
        modifications: &ProposalModifications,
    ) -> Result<TradeProposal, ProposalError> {
        let side = modifications.side.unwrap_or(proposal.side);
        let quantity = modifications.quantity.unwrap_or(proposal.quantity);

        let mut amended = match modifications.price {
            Some(price) => {
                let request = TradeRequest {
                    ticker: proposal.ticker.clone(),
                    side,
                    quantity,
                    price: Some(price),
                };
                self.build(&request).await?
            }
            None => {
                validate_quantity(quantity)?;
                TradeProposal::new(
                    proposal.ticker.clone(),
                    side,
                    quantity,
                    proposal.price,
                    proposal.order_kind,
                )?
            }
        };

        amended.supersedes = Some(proposal.id);
        Ok(amended)
    }

    async fn resolve_price(&self, ticker: &str) -> Result<Decimal, ProposalError> {
        let price = self
            .market
            .latest_price(ticker)
            .await
            .map_err(|e| ProposalError::PriceUnavailable {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })?;

        if price <= Decimal::ZERO {
            return Err(ProposalError::PriceUnavailable {
                ticker: ticker.to_string(),
                reason: format!("{} returned non-positive price {price}", self.market.name()),
            });
        }

        Ok(price)
    }
}

fn normalize_ticker(ticker: &str) -> Result<String, ProposalError> {
    let ticker = ticker.trim();
    if ticker.is_empty() || ticker.chars().any(char::is_whitespace) {
        return Err(ProposalError::InvalidTicker(ticker.to_string()));
    }
    Ok(ticker.to_ascii_uppercase())
}

fn validate_quantity(quantity: Decimal) -> Result<(), ProposalError> {
    if quantity <= Decimal::ZERO {
        return Err(ProposalError::InvalidQuantity(quantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::types::{ProposalStatus, Side};
    use advisor_data::StaticMarketData;
    use rust_decimal_macros::dec;

    fn builder() -> ProposalBuilder {
        ProposalBuilder::new(Arc::new(StaticMarketData::new().with_price("005930", dec!(75000))))
    }

    #[tokio::test]
    async fn test_resolves_missing_price() {
        let proposal = builder()
            .build(&TradeRequest::market(" 005930 ", Side::Buy, dec!(100)))
            .await
            .unwrap();

        assert_eq!(proposal.ticker, "005930");
        assert_eq!(proposal.price, dec!(75000));
        assert_eq!(proposal.total_amount, dec!(7500000));
        assert_eq!(proposal.order_kind, OrderKind::Market);
        assert_eq!(proposal.status, ProposalStatus::Pending);
    }

    #[tokio::test]
    async fn test_zero_price_is_resolved() {
        let proposal = builder()
            .build(&TradeRequest::limit("005930", Side::Buy, dec!(1), Decimal::ZERO))
            .await
            .unwrap();
        assert_eq!(proposal.price, dec!(75000));
    }

    #[tokio::test]
    async fn test_supplied_price_is_limit() {
        let proposal = builder()
            .build(&TradeRequest::limit("aapl", Side::Sell, dec!(3), dec!(190.5)))
            .await
            .unwrap();

        assert_eq!(proposal.ticker, "AAPL");
        assert_eq!(proposal.order_kind, OrderKind::Limit);
        assert_eq!(proposal.total_amount, dec!(571.5));
    }

    #[tokio::test]
    async fn test_price_unavailable() {
        let err = builder()
            .build(&TradeRequest::market("UNKNOWN", Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::PriceUnavailable { ticker, .. } if ticker == "UNKNOWN"));
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let b = builder();
        assert!(matches!(
            b.build(&TradeRequest::limit("X", Side::Buy, dec!(0), dec!(1))).await,
            Err(ProposalError::InvalidQuantity(_))
        ));
        assert!(matches!(
            b.build(&TradeRequest::limit("X", Side::Buy, dec!(1), dec!(-1))).await,
            Err(ProposalError::InvalidPrice(_))
        ));
        assert!(matches!(
            b.build(&TradeRequest::limit("  ", Side::Buy, dec!(1), dec!(1))).await,
            Err(ProposalError::InvalidTicker(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_amount_is_rejected() {
        let b = builder();
        let huge = Decimal::from_i128_with_scale(10_i128.pow(22), 0);
        let err = b
            .build(&TradeRequest::limit("X", Side::Buy, huge, dec!(100000000)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::AmountOverflow { .. }));

        let original = b
            .build(&TradeRequest::market("005930", Side::Buy, dec!(1)))
            .await
            .unwrap();
        let edit = ProposalModifications {
            quantity: Some(Decimal::MAX),
            ..Default::default()
        };
        assert!(matches!(
            b.amend(&original, &edit).await,
            Err(ProposalError::AmountOverflow { .. })
        ));
    }

    #[tokio::test]
    async fn test_amend_keeps_unmodified_fields() {
        let b = builder();
        let original = b
            .build(&TradeRequest::market("005930", Side::Buy, dec!(100)))
            .await
            .unwrap();

        let amended = b
            .amend(
                &original,
                &ProposalModifications {
                    quantity: Some(dec!(50)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_ne!(amended.id, original.id);
        assert_eq!(amended.supersedes, Some(original.id));
        assert_eq!(amended.quantity, dec!(50));
        assert_eq!(amended.price, original.price);
        assert_eq!(amended.order_kind, OrderKind::Market);
        assert_eq!(amended.total_amount, dec!(3750000));
    }

    #[tokio::test]
    async fn test_amend_price_and_side() {
        let b = builder();
        let original = b
            .build(&TradeRequest::limit("005930", Side::Buy, dec!(10), dec!(70000)))
            .await
            .unwrap();

        let amended = b
            .amend(
                &original,
                &ProposalModifications {
                    price: Some(Decimal::ZERO),
                    side: Some(Side::Sell),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(amended.side, Side::Sell);
        assert_eq!(amended.price, dec!(75000));
        assert_eq!(amended.order_kind, OrderKind::Market);
    }
}
