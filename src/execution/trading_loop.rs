use super::executor::{plan_order, ExecutionAction};
use super::shutdown::Shutdown;
use crate::api::{Exchange, IndicatorSource, OrderRequest};
use crate::config::Settings;
use crate::error::BotError;
use crate::models::{IndicatorSample, PriceSide, TradeAction, TradeRecord};
use crate::persistence::HistoryStore;
use crate::strategy::{HysteresisStrategy, Intents};
use crate::Result;
use tokio::time::{sleep, Duration};

/// Market and timing parameters of the loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Symbol passed to the indicator source
    pub indicator_symbol: String,
    /// Exchange market, e.g. `BTCINR`
    pub market: String,
    /// Coin sold on a sell intent
    pub coin: String,
    /// Currency spent on a buy intent
    pub base_currency: String,
    pub quantity_decimal_places: u32,
    pub quote_decimal_places: u32,
    pub poll_interval: Duration,
}

impl LoopConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            indicator_symbol: settings.indicator_ticker().to_string(),
            market: settings.market.symbol.clone(),
            coin: settings.market.coin.clone(),
            base_currency: settings.market.base_currency.clone(),
            quantity_decimal_places: settings.market.quantity_decimal_places,
            quote_decimal_places: settings.market.quote_decimal_places,
            poll_interval: settings.control.poll_interval(),
        }
    }
}

/// Outcome of one successful cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub rsi: f64,
    pub intents: Intents,
    pub trades: Vec<TradeRecord>,
}

struct ExecutionFailure {
    error: BotError,
    /// An order request went out; the latch must stay cleared
    order_sent: bool,
}

impl ExecutionFailure {
    fn before_order(error: BotError) -> Self {
        Self {
            error,
            order_sent: false,
        }
    }

    fn after_order(error: BotError) -> Self {
        Self {
            error,
            order_sent: true,
        }
    }
}

/// Poll → decide → execute → persist, one cycle at a time
pub struct TradingLoop {
    config: LoopConfig,
    strategy: HysteresisStrategy,
    source: Box<dyn IndicatorSource>,
    exchange: Box<dyn Exchange>,
    history: Box<dyn HistoryStore>,
}

impl TradingLoop {
    pub fn new(
        config: LoopConfig,
        strategy: HysteresisStrategy,
        source: Box<dyn IndicatorSource>,
        exchange: Box<dyn Exchange>,
        history: Box<dyn HistoryStore>,
    ) -> Self {
        Self {
            config,
            strategy,
            source,
            exchange,
            history,
        }
    }

    pub fn strategy(&self) -> &HysteresisStrategy {
        &self.strategy
    }

    /// Run one full cycle.
    ///
    /// A fetch or sample-persistence error abandons the cycle. Each pending
    /// intent is then executed on its own: one that fails before an order
    /// request is sent is re-armed so the next in-band sample retries it,
    /// and the first execution error is returned once every intent ran.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let rsi = self.source.fetch_rsi(&self.config.indicator_symbol).await?;
        tracing::info!("📈 RSI == {:.2}", rsi);
        self.history.append_sample(&IndicatorSample::now(rsi)).await?;

        let intents = self.strategy.evaluate(rsi);
        let state = self.strategy.state();
        let thresholds = self.strategy.thresholds();
        tracing::info!(
            sell_value = thresholds.sell_value,
            above = state.armed_to_sell,
            buy_value = thresholds.buy_value,
            below = state.armed_to_buy,
            "Strategy state"
        );

        let pending = intents.actions();
        let mut trades = Vec::with_capacity(pending.len());
        let mut first_error = None;

        for action in pending {
            match self.execute(action, rsi).await {
                Ok(record) => trades.push(record),
                Err(failure) => {
                    if !failure.order_sent {
                        self.strategy.rearm(action);
                    }
                    tracing::warn!(
                        order_sent = failure.order_sent,
                        "✗ {} intent failed: {}",
                        action,
                        failure.error
                    );
                    first_error.get_or_insert(failure.error);
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        Ok(CycleReport {
            rsi,
            intents,
            trades,
        })
    }

    async fn execute(
        &self,
        action: TradeAction,
        rsi: f64,
    ) -> std::result::Result<TradeRecord, ExecutionFailure> {
        let (currency, places, side) = match action {
            TradeAction::Sell => (
                self.config.coin.as_str(),
                self.config.quantity_decimal_places,
                PriceSide::Ask,
            ),
            TradeAction::Buy => (
                self.config.base_currency.as_str(),
                self.config.quote_decimal_places,
                PriceSide::Bid,
            ),
        };

        tracing::info!("💹 {} intent on {}", action.as_str().to_uppercase(), self.config.market);

        let available = self
            .exchange
            .get_balance(currency, places)
            .await
            .map_err(ExecutionFailure::before_order)?
            .ok_or_else(|| {
                ExecutionFailure::before_order(BotError::DataShape(format!(
                    "no {} balance in account",
                    currency
                )))
            })?;

        let price = self
            .exchange
            .get_price(&self.config.market, side)
            .await
            .map_err(ExecutionFailure::before_order)?
            .ok_or_else(|| {
                ExecutionFailure::before_order(BotError::DataShape(format!(
                    "no {} price for {}",
                    side.field(),
                    self.config.market
                )))
            })?;

        let decision =
            plan_order(action, available, price).map_err(ExecutionFailure::before_order)?;

        match decision.action {
            ExecutionAction::Execute { quantity } => {
                let order = OrderRequest::limit(action, &self.config.market, price, quantity);
                let result = self
                    .exchange
                    .submit_order(&order)
                    .await
                    .map_err(ExecutionFailure::after_order)?;

                if result.is_rejected() {
                    tracing::warn!(
                        response = %result.body,
                        "⚠️  {} order rejected by exchange",
                        action
                    );
                } else {
                    tracing::info!(
                        "✅ {} {} {} @ {}",
                        action.as_str().to_uppercase(),
                        quantity,
                        self.config.market,
                        price
                    );
                }
            }
            ExecutionAction::Skip => {
                tracing::info!("⏭️  Skipping {}: {}", action, decision.reason);
            }
        }

        let record = TradeRecord::now(action, rsi, price, decision.quantity());
        self.history.append_trade(&record).await.map_err(|error| ExecutionFailure {
            error,
            order_sent: record.was_submitted(),
        })?;

        Ok(record)
    }

    /// Run cycles until `shutdown` fires.
    ///
    /// Cycle failures are logged and never end the loop. Shutdown is checked
    /// before each cycle and raced against both the cycle and the pause.
    pub async fn run(&mut self, mut shutdown: Shutdown) {
        tracing::info!(
            "🔄 Trading loop starting (poll every {:?})",
            self.config.poll_interval
        );
        let mut cycle: u64 = 0;

        loop {
            if shutdown.is_triggered() {
                break;
            }
            cycle += 1;

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                result = self.run_cycle() => match result {
                    Ok(report) => {
                        for trade in &report.trades {
                            tracing::info!(
                                cycle,
                                action = %trade.action,
                                quantity = trade.quantity,
                                price = %trade.price,
                                "Trade recorded"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(cycle, kind = ?e.kind(), "✗ Cycle abandoned: {}", e);
                    }
                },
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("👋 Trading loop stopped after {} cycles", cycle);
    }
}
