use crate::error::BotError;
use crate::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Cut a decimal string to `places` fractional digits without rounding.
///
/// Works on the text so `"123.456789"` at 2 places is exactly `123.45`.
pub fn truncate_decimal_str(value: &str, places: u32) -> Result<Decimal> {
    let value = value.trim();
    let truncated = match value.split_once('.') {
        Some((whole, fraction)) => {
            let kept: String = fraction.chars().take(places as usize).collect();
            if kept.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, kept)
            }
        }
        None => value.to_string(),
    };

    Decimal::from_str(&truncated)
        .map_err(|e| BotError::DataShape(format!("invalid balance {:?}: {}", value, e)))
}

/// Whole units held, dropping any fraction
pub fn whole_units(amount: Decimal) -> u64 {
    if amount.is_sign_negative() {
        return 0;
    }
    amount.trunc().to_u64().unwrap_or(0)
}

/// How many whole units `quote_balance` can pay for at `price`
pub fn purchasable_quantity(quote_balance: Decimal, price: Decimal) -> Result<u64> {
    if price <= Decimal::ZERO {
        return Err(BotError::DataShape(format!("non-positive price {}", price)));
    }
    let units = quote_balance
        .checked_div(price)
        .ok_or_else(|| {
            BotError::DataShape(format!("cannot divide {} by {}", quote_balance, price))
        })?;
    Ok(whole_units(units.floor()))
}
