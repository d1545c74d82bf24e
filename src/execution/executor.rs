use rust_decimal::Decimal;

use super::sizing::{purchasable_quantity, whole_units};
use crate::models::TradeAction;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Execute { quantity: u64 },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

impl ExecutionDecision {
    /// Quantity that goes into the trade record, 0 when skipped
    pub fn quantity(&self) -> u64 {
        match self.action {
            ExecutionAction::Execute { quantity } => quantity,
            ExecutionAction::Skip => 0,
        }
    }
}

/// Decide how much of an intent can actually be traded.
///
/// `available` is the held coin for a sell and the quote balance for a buy.
pub fn plan_order(
    action: TradeAction,
    available: Decimal,
    price: Decimal,
) -> Result<ExecutionDecision> {
    match action {
        TradeAction::Sell => {
            let quantity = whole_units(available);
            if quantity == 0 {
                return Ok(ExecutionDecision {
                    action: ExecutionAction::Skip,
                    reason: format!("Nothing to sell: holding {}", available),
                });
            }
            Ok(ExecutionDecision {
                action: ExecutionAction::Execute { quantity },
                reason: format!("Selling {} whole units of {}", quantity, available),
            })
        }

        TradeAction::Buy => {
            let quantity = purchasable_quantity(available, price)?;
            if quantity == 0 {
                return Ok(ExecutionDecision {
                    action: ExecutionAction::Skip,
                    reason: format!(
                        "Insufficient funds: {} does not cover one unit at {}",
                        available, price
                    ),
                });
            }
            Ok(ExecutionDecision {
                action: ExecutionAction::Execute { quantity },
                reason: format!("Buying {} units with {} at {}", quantity, available, price),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sell_uses_whole_units() {
        let decision =
            plan_order(TradeAction::Sell, Decimal::new(275, 2), Decimal::new(100, 0)).unwrap();
        assert_eq!(decision.action, ExecutionAction::Execute { quantity: 2 });
    }

    #[test]
    fn test_skip_sell_when_less_than_one_unit() {
        let decision =
            plan_order(TradeAction::Sell, Decimal::new(5, 1), Decimal::new(100, 0)).unwrap();
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert_eq!(decision.quantity(), 0);
        assert!(decision.reason.contains("Nothing to sell"));
    }

    #[test]
    fn test_buy_floors_quote_over_price() {
        let decision =
            plan_order(TradeAction::Buy, Decimal::new(1_000, 0), Decimal::new(33_333, 2)).unwrap();
        assert_eq!(decision.action, ExecutionAction::Execute { quantity: 3 });
        assert_eq!(decision.quantity(), 3);
    }

    #[test]
    fn test_skip_buy_when_underfunded() {
        let decision =
            plan_order(TradeAction::Buy, Decimal::new(50, 0), Decimal::new(100, 0)).unwrap();
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(decision.reason.contains("Insufficient funds"));
    }

    #[test]
    fn test_buy_with_zero_price_is_error() {
        assert!(plan_order(TradeAction::Buy, Decimal::new(50, 0), Decimal::ZERO).is_err());
    }
}
