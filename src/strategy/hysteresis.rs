use crate::models::TradeAction;

/// RSI band edges. `sell_value >= buy_value` is checked at config load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub sell_value: f64,
    pub buy_value: f64,
}

impl Thresholds {
    pub fn new(sell_value: f64, buy_value: f64) -> Self {
        Self {
            sell_value,
            buy_value,
        }
    }

    /// `buy_value <= rsi <= sell_value`
    pub fn contains(&self, rsi: f64) -> bool {
        rsi >= self.buy_value && rsi <= self.sell_value
    }
}

/// The two independent latches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyState {
    pub armed_to_sell: bool,
    pub armed_to_buy: bool,
}

/// What one evaluation asks the executor to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub sell: bool,
    pub buy: bool,
}

impl Intents {
    pub fn is_empty(&self) -> bool {
        !self.sell && !self.buy
    }

    /// Pending actions in execution order, sell before buy
    pub fn actions(&self) -> Vec<TradeAction> {
        let mut actions = Vec::with_capacity(2);
        if self.sell {
            actions.push(TradeAction::Sell);
        }
        if self.buy {
            actions.push(TradeAction::Buy);
        }
        actions
    }
}

/// Pure transition function.
///
/// Excursions arm: above `sell_value` arms the sell latch, below `buy_value`
/// arms the buy latch. A later in-band sample fires and disarms every armed
/// latch. An in-band sample cannot arm anything, so a latch fires at most once
/// per excursion. NaN is neither outside nor inside the band and is a no-op.
pub fn transition(
    state: StrategyState,
    thresholds: &Thresholds,
    rsi: f64,
) -> (StrategyState, Intents) {
    let mut next = state;
    let mut intents = Intents::default();

    if rsi > thresholds.sell_value {
        next.armed_to_sell = true;
    }
    if rsi < thresholds.buy_value {
        next.armed_to_buy = true;
    }

    if thresholds.contains(rsi) {
        if next.armed_to_sell {
            intents.sell = true;
            next.armed_to_sell = false;
        }
        if next.armed_to_buy {
            intents.buy = true;
            next.armed_to_buy = false;
        }
    }

    (next, intents)
}

/// Hysteresis strategy around an RSI band
///
/// Waits for the indicator to leave the neutral band and then come back into
/// it before acting, so it never trades against a still-extending move.
#[derive(Debug, Clone)]
pub struct HysteresisStrategy {
    thresholds: Thresholds,
    state: StrategyState,
}

impl HysteresisStrategy {
    pub fn new(thresholds: Thresholds, initial: StrategyState) -> Self {
        Self {
            thresholds,
            state: initial,
        }
    }

    /// Starts passive: both latches disarmed
    pub fn passive(thresholds: Thresholds) -> Self {
        Self::new(thresholds, StrategyState::default())
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn evaluate(&mut self, rsi: f64) -> Intents {
        let (next, intents) = transition(self.state, &self.thresholds, rsi);
        self.state = next;
        intents
    }

    /// Put a latch back after its action could not reach the exchange
    pub fn rearm(&mut self, action: TradeAction) {
        match action {
            TradeAction::Sell => self.state.armed_to_sell = true,
            TradeAction::Buy => self.state.armed_to_buy = true,
        }
    }

    pub fn name(&self) -> &str {
        "RsiHysteresis"
    }
}
