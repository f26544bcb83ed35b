//! One scan cycle: list markets, quote the target outcome, hunt the tail.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::filter::{TailFilter, TailOpportunity};
use crate::config::Config;
use crate::error::MarketError;
use crate::exchange::Exchange;
use crate::market::{resolve_token_id, Market};
use crate::metrics;
use crate::trading::{OrderReceipt, Side};

/// What happened to a single market during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketOutcome {
    /// Market is inactive or closed.
    NotTradable,
    /// Market has no token for the target outcome.
    NoTargetToken,
    /// Price lookup failed.
    PriceUnavailable {
        /// Failure reason.
        reason: String,
    },
    /// Price outside the tail band.
    OutsideBand {
        /// Quoted price.
        price: Decimal,
    },
    /// In band, but sizing rejected the price.
    Rejected {
        /// Sizing error.
        reason: String,
    },
    /// Order accepted by the exchange.
    Placed {
        /// The opportunity ordered.
        opportunity: TailOpportunity,
        /// Exchange acknowledgement.
        receipt: OrderReceipt,
    },
    /// Dry run: order logged, not submitted.
    Simulated {
        /// The opportunity that would be ordered.
        opportunity: TailOpportunity,
    },
    /// Order submission failed.
    OrderFailed {
        /// The opportunity that failed.
        opportunity: TailOpportunity,
        /// Failure reason.
        reason: String,
    },
    /// Per-cycle spend cap reached.
    BudgetExhausted {
        /// The opportunity skipped.
        opportunity: TailOpportunity,
    },
}

/// Summary of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Markets returned by the listing.
    pub markets_listed: usize,
    /// Markets skipped as inactive or closed.
    pub not_tradable: usize,
    /// Tradable markets evaluated.
    pub markets_evaluated: usize,
    /// Markets without a target-outcome token.
    pub no_target_token: usize,
    /// Price lookups that failed.
    pub price_failures: usize,
    /// Prices outside the band.
    pub outside_band: usize,
    /// In-band prices rejected by sizing.
    pub sizing_rejected: usize,
    /// Orders accepted.
    pub orders_placed: usize,
    /// Orders that failed.
    pub orders_failed: usize,
    /// Orders logged in dry-run mode.
    pub orders_simulated: usize,
    /// Opportunities skipped because of the spend cap.
    pub budget_skipped: usize,
    /// Notional placed or simulated this cycle.
    pub notional: Decimal,
    /// Every in-band opportunity found.
    pub opportunities: Vec<TailOpportunity>,
    /// Receipts for accepted orders.
    pub receipts: Vec<OrderReceipt>,
}

impl CycleReport {
    fn record(&mut self, outcome: MarketOutcome) {
        if outcome != MarketOutcome::NotTradable {
            self.markets_evaluated += 1;
        }
        match outcome {
            MarketOutcome::NotTradable => self.not_tradable += 1,
            MarketOutcome::NoTargetToken => self.no_target_token += 1,
            MarketOutcome::PriceUnavailable { .. } => self.price_failures += 1,
            MarketOutcome::OutsideBand { .. } => self.outside_band += 1,
            MarketOutcome::Rejected { .. } => self.sizing_rejected += 1,
            MarketOutcome::Placed {
                opportunity,
                receipt,
            } => {
                self.orders_placed += 1;
                self.notional += opportunity.notional;
                self.opportunities.push(opportunity);
                self.receipts.push(receipt);
            }
            MarketOutcome::Simulated { opportunity } => {
                self.orders_simulated += 1;
                self.notional += opportunity.notional;
                self.opportunities.push(opportunity);
            }
            MarketOutcome::OrderFailed { opportunity, .. } => {
                self.orders_failed += 1;
                self.opportunities.push(opportunity);
            }
            MarketOutcome::BudgetExhausted { opportunity } => {
                self.budget_skipped += 1;
                self.opportunities.push(opportunity);
            }
        }
    }
}

/// Scans every listed market once per cycle and orders in-band tails.
#[derive(Debug)]
pub struct TailScanner<E> {
    exchange: E,
    filter: TailFilter,
    target_outcome: String,
    dry_run: bool,
    max_cycle_spend: Option<Decimal>,
}

impl<E: Exchange> TailScanner<E> {
    /// Create a live scanner with no spend cap.
    pub fn new(exchange: E, filter: TailFilter, target_outcome: impl Into<String>) -> Self {
        Self {
            exchange,
            filter,
            target_outcome: target_outcome.into(),
            dry_run: false,
            max_cycle_spend: None,
        }
    }

    /// Create a scanner from config.
    pub fn from_config(exchange: E, config: &Config) -> Self {
        Self::new(
            exchange,
            TailFilter::from_config(config),
            config.target_outcome.clone(),
        )
        .with_dry_run(config.dry_run)
        .with_max_cycle_spend(config.max_cycle_spend)
    }

    /// Log orders instead of submitting them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Cap the notional placed within one cycle.
    pub fn with_max_cycle_spend(mut self, cap: Option<Decimal>) -> Self {
        self.max_cycle_spend = cap;
        self
    }

    /// Whether orders are only simulated.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one full pass over the market listing.
    ///
    /// Only a listing failure fails the cycle; every per-market error is
    /// logged and counted.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn scan_cycle(&self) -> Result<CycleReport, MarketError> {
        info!(
            band_min = %self.filter.price_min,
            band_max = %self.filter.price_max,
            downside_limit = %self.filter.downside_limit,
            "Starting market scan"
        );

        let markets = self.exchange.fetch_markets().await?;

        let mut report = CycleReport {
            markets_listed: markets.len(),
            ..CycleReport::default()
        };

        for market in &markets {
            let outcome = self.evaluate_market(market, report.notional).await;
            report.record(outcome);
        }

        info!(
            listed = report.markets_listed,
            evaluated = report.markets_evaluated,
            opportunities = report.opportunities.len(),
            placed = report.orders_placed,
            simulated = report.orders_simulated,
            failed = report.orders_failed,
            price_failures = report.price_failures,
            notional = %report.notional,
            "Scan cycle complete"
        );

        Ok(report)
    }

    async fn evaluate_market(&self, market: &Market, spent: Decimal) -> MarketOutcome {
        if !market.is_tradable() {
            return MarketOutcome::NotTradable;
        }
        metrics::inc_markets_evaluated();

        let Some(token_id) = resolve_token_id(market, &self.target_outcome) else {
            debug!(market = %market.label(), "No target outcome token");
            return MarketOutcome::NoTargetToken;
        };

        let quote = match self.exchange.get_price(token_id, Side::Buy).await {
            Ok(quote) => quote,
            Err(e) => {
                metrics::inc_price_fetch_failures();
                warn!(market = %market.label(), token_id, error = %e, "Price lookup failed");
                return MarketOutcome::PriceUnavailable {
                    reason: e.to_string(),
                };
            }
        };

        let opportunity = match self.filter.evaluate(token_id, market.label(), quote.value()) {
            Ok(Some(opportunity)) => opportunity,
            Ok(None) => {
                return MarketOutcome::OutsideBand {
                    price: quote.value(),
                }
            }
            Err(e) => {
                warn!(market = %market.label(), price = %quote, error = %e, "Sizing rejected price");
                return MarketOutcome::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        metrics::inc_tail_opportunities();
        info!(
            market = %opportunity.label,
            token_id = %opportunity.token_id,
            price = %opportunity.price,
            quantity = %opportunity.quantity,
            "Hunted tail outcome"
        );

        if let Some(cap) = self.max_cycle_spend {
            if spent + opportunity.notional > cap {
                info!(spent = %spent, cap = %cap, "Cycle spend cap reached, skipping order");
                return MarketOutcome::BudgetExhausted { opportunity };
            }
        }

        if self.dry_run {
            metrics::inc_orders_simulated();
            info!(
                token_id = %opportunity.token_id,
                price = %opportunity.price,
                size = %opportunity.order().lot_size(),
                "[DRY RUN] Would place limit BUY"
            );
            return MarketOutcome::Simulated { opportunity };
        }

        match self.exchange.submit_limit_order(&opportunity.order()).await {
            Ok(receipt) => {
                metrics::inc_orders_submitted();
                info!(order_id = %receipt.order_id, market = %opportunity.label, "Order placed");
                MarketOutcome::Placed {
                    opportunity,
                    receipt,
                }
            }
            Err(e) => {
                metrics::inc_orders_failed();
                warn!(market = %opportunity.label, error = %e, "Order failed");
                MarketOutcome::OrderFailed {
                    opportunity,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{binary_market, MockExchange, OutcomeToken};
    use crate::trading::OrderParams;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn scanner(exchange: MockExchange) -> TailScanner<MockExchange> {
        TailScanner::new(
            exchange,
            TailFilter::new(dec!(0.01), dec!(0.03), dec!(2.0)),
            "YES",
        )
    }

    #[tokio::test]
    async fn places_order_for_in_band_yes_token() {
        let exchange = MockExchange::new()
            .with_market(binary_market("m1", "T1", "T2"))
            .with_price("T1", dec!(0.02));
        let handle = exchange.clone();

        let report = scanner(exchange).scan_cycle().await.unwrap();

        assert_eq!(
            handle.orders(),
            vec![OrderParams::buy("T1", dec!(0.02), dec!(100))]
        );
        assert_eq!(report.orders_placed, 1);
        assert_eq!(report.receipts[0].order_id, "mock-order-1");
        assert_eq!(report.notional, dec!(2.00));
    }

    #[tokio::test]
    async fn no_order_above_band() {
        let exchange = MockExchange::new()
            .with_market(binary_market("m1", "T1", "T2"))
            .with_price("T1", dec!(0.05));
        let handle = exchange.clone();

        let report = scanner(exchange).scan_cycle().await.unwrap();

        assert!(handle.orders().is_empty());
        assert_eq!(report.outside_band, 1);
    }

    #[tokio::test]
    async fn price_failure_does_not_abort_cycle() {
        let exchange = MockExchange::new()
            .with_market(binary_market("m1", "A1", "A2"))
            .with_market(binary_market("m2", "B1", "B2"))
            .with_market(binary_market("m3", "C1", "C2"))
            .with_price("A1", dec!(0.02))
            .with_failing_price("B1")
            .with_price("C1", dec!(0.01));
        let handle = exchange.clone();

        let report = scanner(exchange).scan_cycle().await.unwrap();

        assert_eq!(handle.price_calls(), 3);
        assert_eq!(report.price_failures, 1);
        assert_eq!(report.orders_placed, 2);
        let tokens: Vec<_> = handle.orders().into_iter().map(|o| o.token_id).collect();
        assert_eq!(tokens, vec!["A1".to_string(), "C1".to_string()]);
    }

    #[tokio::test]
    async fn inactive_and_closed_markets_are_skipped() {
        let mut inactive = binary_market("m1", "T1", "T2");
        inactive.active = false;
        let mut closed = binary_market("m2", "T3", "T4");
        closed.closed = true;

        let exchange = MockExchange::new()
            .with_market(inactive)
            .with_market(closed)
            .with_price("T1", dec!(0.02))
            .with_price("T3", dec!(0.02));
        let handle = exchange.clone();

        let report = scanner(exchange).scan_cycle().await.unwrap();

        assert_eq!(report.not_tradable, 2);
        assert_eq!(report.markets_evaluated, 0);
        assert_eq!(handle.price_calls(), 0);
        assert!(handle.orders().is_empty());
    }

    #[tokio::test]
    async fn market_without_yes_token_is_skipped() {
        let market = Market {
            condition_id: "m1".to_string(),
            question: None,
            active: true,
            closed: false,
            tokens: vec![
                OutcomeToken::new("T1", "Trump"),
                OutcomeToken::new("T2", "Harris"),
            ],
        };
        let exchange = MockExchange::new().with_market(market);
        let handle = exchange.clone();

        let report = scanner(exchange).scan_cycle().await.unwrap();

        assert_eq!(report.no_target_token, 1);
        assert_eq!(handle.price_calls(), 0);
    }

    #[tokio::test]
    async fn order_failure_does_not_stop_later_markets() {
        let exchange = MockExchange::new()
            .with_market(binary_market("m1", "A1", "A2"))
            .with_market(binary_market("m2", "B1", "B2"))
            .with_price("A1", dec!(0.02))
            .with_price("B1", dec!(0.03))
            .with_failing_order("A1");
        let handle = exchange.clone();

        let report = scanner(exchange).scan_cycle().await.unwrap();

        assert_eq!(report.orders_failed, 1);
        assert_eq!(report.orders_placed, 1);
        assert_eq!(handle.orders()[0].token_id, "B1");
    }

    #[tokio::test]
    async fn dry_run_simulates_without_submitting() {
        let exchange = MockExchange::new()
            .with_market(binary_market("m1", "T1", "T2"))
            .with_price("T1", dec!(0.02));
        let handle = exchange.clone();

        let report = scanner(exchange)
            .with_dry_run(true)
            .scan_cycle()
            .await
            .unwrap();

        assert!(handle.orders().is_empty());
        assert_eq!(report.orders_simulated, 1);
        assert_eq!(report.opportunities[0].quantity, dec!(100));
    }

    #[tokio::test]
    async fn spend_cap_stops_further_orders() {
        let exchange = MockExchange::new()
            .with_market(binary_market("m1", "A1", "A2"))
            .with_market(binary_market("m2", "B1", "B2"))
            .with_market(binary_market("m3", "C1", "C2"))
            .with_price("A1", dec!(0.02))
            .with_price("B1", dec!(0.02))
            .with_price("C1", dec!(0.02));
        let handle = exchange.clone();

        let report = scanner(exchange)
            .with_max_cycle_spend(Some(dec!(4.0)))
            .scan_cycle()
            .await
            .unwrap();

        assert_eq!(handle.orders().len(), 2);
        assert_eq!(report.budget_skipped, 1);
        assert_eq!(report.notional, dec!(4.00));
    }

    #[tokio::test]
    async fn listing_failure_fails_the_cycle() {
        let exchange = MockExchange::new().with_listing_failures(1);
        assert!(scanner(exchange).scan_cycle().await.is_err());
    }
}
