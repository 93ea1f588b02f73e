//! Paper executor for simulation and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dca_core::error::{DataError, ExecutionError};
use dca_core::traits::TradeExecutor;
use dca_core::types::{Fill, PortfolioSnapshot, Side, TradeAction};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::debug;

/// Sell shortfall below this much quote currency is treated as rounding and the whole
/// position is sold.
const DUST_NOTIONAL: Decimal = dec!(0.01);

/// Smallest notional increment a paper fill is sized in.
const MIN_NOTIONAL_STEP: Decimal = dec!(0.00000001);

/// Applies trade actions to an in-memory book at externally supplied prices.
///
/// Never invents a price: trading a symbol without one is an error.
#[derive(Debug, Clone)]
pub struct PaperExecutor {
    holdings: BTreeMap<String, Decimal>,
    cash: Decimal,
    prices: BTreeMap<String, Decimal>,
    fee_bps: Decimal,
    timestamp: DateTime<Utc>,
}

impl PaperExecutor {
    /// Create a paper executor holding only cash.
    pub fn new(cash: Decimal) -> Self {
        Self {
            holdings: BTreeMap::new(),
            cash,
            prices: BTreeMap::new(),
            fee_bps: Decimal::ZERO,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Start from existing holdings.
    pub fn with_holdings(mut self, holdings: BTreeMap<String, Decimal>) -> Self {
        self.holdings = holdings;
        self
    }

    /// Set the fee in basis points of notional.
    pub fn with_fee_bps(mut self, fee_bps: Decimal) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    /// Update prices and the clock used for fills.
    pub fn set_prices(&mut self, prices: BTreeMap<String, Decimal>, timestamp: DateTime<Utc>) {
        self.prices = prices;
        self.timestamp = timestamp;
    }

    /// Add cash, e.g. a recurring contribution.
    pub fn deposit(&mut self, amount: Decimal) {
        self.cash += amount;
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn holdings(&self) -> &BTreeMap<String, Decimal> {
        &self.holdings
    }

    /// Units held of a symbol.
    pub fn amount(&self, symbol: &str) -> Decimal {
        self.holdings.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Value the book at the current prices.
    pub fn snapshot(&self) -> Result<PortfolioSnapshot, DataError> {
        PortfolioSnapshot::from_holdings(&self.holdings, &self.prices, self.cash, self.timestamp)
    }

    fn fee(&self, notional: Decimal) -> Decimal {
        (notional * self.fee_bps / dec!(10000)).round_dp(8)
    }

    fn price(&self, symbol: &str) -> Result<Decimal, ExecutionError> {
        match self.prices.get(symbol) {
            Some(price) if *price > Decimal::ZERO => Ok(*price),
            Some(price) => Err(ExecutionError::Rejected(format!(
                "non-positive price {} for {}",
                price, symbol
            ))),
            None => Err(ExecutionError::MissingPrice(symbol.to_string())),
        }
    }

    fn buy(&mut self, action: &TradeAction, price: Decimal) -> Result<Fill, ExecutionError> {
        if self.cash <= Decimal::ZERO {
            return Err(ExecutionError::InsufficientCash {
                required: action.notional + self.fee(action.notional),
                available: self.cash,
            });
        }

        let mut notional = action.notional;
        let mut fee = self.fee(notional);
        if notional + fee > self.cash {
            // Fill what the cash allows, never rounding past it
            let rate = self.fee_bps / dec!(10000);
            notional = (self.cash / (Decimal::ONE + rate))
                .round_dp_with_strategy(8, RoundingStrategy::ToZero);
            fee = self.fee(notional);
            while notional > Decimal::ZERO && notional + fee > self.cash {
                notional -= MIN_NOTIONAL_STEP;
                fee = self.fee(notional);
            }
            // Dust below one step fills nothing
            notional = notional.max(Decimal::ZERO);
            fee = self.fee(notional);
            debug!(
                symbol = %action.symbol,
                requested = %action.notional,
                filled = %notional,
                "buy reduced to available cash"
            );
        }

        let amount = notional / price;
        *self.holdings.entry(action.symbol.clone()).or_insert(Decimal::ZERO) += amount;
        self.cash -= notional + fee;

        Ok(Fill {
            symbol: action.symbol.clone(),
            side: Side::Buy,
            amount,
            price,
            notional,
            fee,
            timestamp: self.timestamp,
        })
    }

    fn sell(&mut self, action: &TradeAction, price: Decimal) -> Result<Fill, ExecutionError> {
        let held = self.amount(&action.symbol);
        let mut amount = action.notional / price;

        if amount > held {
            if (amount - held) * price <= DUST_NOTIONAL {
                amount = held;
            } else {
                return Err(ExecutionError::InsufficientHoldings {
                    symbol: action.symbol.clone(),
                    requested: amount,
                    available: held,
                });
            }
        }

        let notional = amount * price;
        let fee = self.fee(notional);
        let remaining = held - amount;
        if remaining.is_zero() {
            self.holdings.remove(&action.symbol);
        } else {
            self.holdings.insert(action.symbol.clone(), remaining);
        }
        self.cash += notional - fee;

        Ok(Fill {
            symbol: action.symbol.clone(),
            side: Side::Sell,
            amount,
            price,
            notional,
            fee,
            timestamp: self.timestamp,
        })
    }
}

#[async_trait]
impl TradeExecutor for PaperExecutor {
    async fn execute(&mut self, action: &TradeAction) -> Result<Fill, ExecutionError> {
        let price = self.price(&action.symbol)?;
        match action.side {
            Side::Buy => self.buy(action, price),
            Side::Sell => self.sell(action, price),
        }
    }

    fn name(&self) -> &str {
        "Paper Executor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(symbol: &str, side: Side, notional: Decimal) -> TradeAction {
        TradeAction {
            symbol: symbol.to_string(),
            side,
            notional,
            priority: TradeAction::PRIORITY_HIGH,
            current_weight: 0.0,
            target_weight: 0.0,
        }
    }

    fn create_executor() -> PaperExecutor {
        let mut executor = PaperExecutor::new(dec!(1000)).with_holdings(BTreeMap::from([(
            "BTC".to_string(),
            dec!(0.1),
        )]));
        executor.set_prices(
            BTreeMap::from([
                ("BTC".to_string(), dec!(50000)),
                ("ETH".to_string(), dec!(2500)),
            ]),
            DateTime::<Utc>::UNIX_EPOCH,
        );
        executor
    }

    #[tokio::test]
    async fn test_paper_buy() {
        let mut executor = create_executor();
        let fill = executor
            .execute(&action("ETH", Side::Buy, dec!(500)))
            .await
            .unwrap();

        assert_eq!(fill.amount, dec!(0.2));
        assert_eq!(executor.cash(), dec!(500));
        assert_eq!(executor.amount("ETH"), dec!(0.2));
    }

    #[tokio::test]
    async fn test_paper_sell_with_fee() {
        let mut executor = create_executor().with_fee_bps(dec!(10));
        let fill = executor
            .execute(&action("BTC", Side::Sell, dec!(1000)))
            .await
            .unwrap();

        assert_eq!(fill.amount, dec!(0.02));
        assert_eq!(fill.fee, dec!(1));
        assert_eq!(executor.cash(), dec!(1999));
        assert_eq!(executor.amount("BTC"), dec!(0.08));
    }

    #[tokio::test]
    async fn test_sell_whole_position_absorbs_rounding() {
        let mut executor = create_executor();
        executor
            .execute(&action("BTC", Side::Sell, dec!(5000.004)))
            .await
            .unwrap();
        assert!(!executor.holdings().contains_key("BTC"));
        assert_eq!(executor.cash(), dec!(6000));
    }

    #[tokio::test]
    async fn test_oversell_rejected() {
        let mut executor = create_executor();
        let result = executor.execute(&action("BTC", Side::Sell, dec!(6000))).await;
        assert!(matches!(
            result,
            Err(ExecutionError::InsufficientHoldings { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_price() {
        let mut executor = create_executor();
        let result = executor.execute(&action("SOL", Side::Buy, dec!(10))).await;
        assert_eq!(result, Err(ExecutionError::MissingPrice("SOL".to_string())));
    }

    #[tokio::test]
    async fn test_buy_limited_by_cash() {
        let mut executor = create_executor();
        let fill = executor
            .execute(&action("ETH", Side::Buy, dec!(1500)))
            .await
            .unwrap();
        assert_eq!(fill.notional, dec!(1000));
        assert_eq!(executor.cash(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_cash_limited_buy_without_fee_books_no_fee() {
        for cash in [dec!(100.000000001), dec!(100.000000006)] {
            let mut executor = create_executor();
            executor.cash = cash;
            let fill = executor
                .execute(&action("ETH", Side::Buy, dec!(200)))
                .await
                .unwrap();

            assert_eq!(fill.fee, Decimal::ZERO);
            assert_eq!(fill.notional, dec!(100));
            assert!(fill.notional <= cash);
            assert!(executor.cash() >= Decimal::ZERO);
            assert_eq!(executor.cash(), cash - dec!(100));
        }
    }

    #[tokio::test]
    async fn test_cash_limited_buy_with_fee_stays_within_cash() {
        let mut executor = create_executor().with_fee_bps(dec!(10));
        executor.cash = dec!(123.456789012345);
        let fill = executor
            .execute(&action("ETH", Side::Buy, dec!(500)))
            .await
            .unwrap();

        assert_eq!(fill.fee, (fill.notional * dec!(0.001)).round_dp(8));
        assert!(fill.notional + fill.fee <= dec!(123.456789012345));
        assert!(executor.cash() >= Decimal::ZERO);
        assert!(executor.cash() < dec!(0.0000001));
    }

    #[test]
    fn test_snapshot() {
        let snapshot = create_executor().snapshot().unwrap();
        assert_eq!(snapshot.total_value, dec!(6000));
        assert!((snapshot.weight("BTC") - 5000.0 / 6000.0).abs() < 1e-12);
    }
}
