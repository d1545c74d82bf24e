use super::signer::{RequestSigner, API_KEY_HEADER, SIGNATURE_HEADER};
use super::Exchange;
use crate::config::ExchangeSettings;
use crate::error::BotError;
use crate::execution::sizing::truncate_decimal_str;
use crate::models::{now_millis, PriceSide, TradeAction};
use crate::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

// CoinDCX REST API
// Docs: https://docs.coindcx.com
const BALANCES_PATH: &str = "/exchange/v1/users/balances";
const TICKER_PATH: &str = "/exchange/ticker";
const CREATE_ORDER_PATH: &str = "/exchange/v1/orders/create";

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    LimitOrder,
    MarketOrder,
}

/// Order to place on the exchange
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: TradeAction,
    pub order_type: OrderType,
    pub market: String,
    pub price: Decimal,
    pub quantity: u64,
}

impl OrderRequest {
    pub fn limit(
        side: TradeAction,
        market: impl Into<String>,
        price: Decimal,
        quantity: u64,
    ) -> Self {
        Self {
            side,
            order_type: OrderType::LimitOrder,
            market: market.into(),
            price,
            quantity,
        }
    }
}

/// Raw response to an order placement
#[derive(Debug, Clone)]
pub struct OrderResult {
    pub status: u16,
    pub body: Value,
}

impl OrderResult {
    /// The exchange sometimes answers 2xx with an error payload
    pub fn is_rejected(&self) -> bool {
        let status_error = self.body.get("status").and_then(Value::as_str) == Some("error");
        let code_error = self
            .body
            .get("code")
            .and_then(Value::as_i64)
            .map(|code| !(200..300).contains(&code))
            .unwrap_or(false);
        status_error || code_error
    }
}

// ============== Wire Types ==============

// Field order is part of the signed payload
#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    side: TradeAction,
    order_type: OrderType,
    market: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price_per_unit: Decimal,
    total_quantity: u64,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct TimestampBody {
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    currency: String,
    balance: Value,
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    market: String,
    #[serde(default)]
    ask: Option<Value>,
    #[serde(default)]
    bid: Option<Value>,
}

/// Accepts `"123.45"` as well as `123.45`
fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(BotError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| BotError::DataShape(format!("{}: {}", what, e)))
}

/// Client for the CoinDCX exchange
#[derive(Clone)]
pub struct CoinDcxClient {
    client: Client,
    base_url: String,
    signer: RequestSigner,
}

impl CoinDcxClient {
    pub fn new(settings: &ExchangeSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            signer: RequestSigner::new(&settings.api_key, &settings.api_secret),
        })
    }

    /// POST `body` with the auth headers; the signed bytes are the bytes sent
    async fn signed_post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let signed = self.signer.sign(body)?;

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.signer.api_key())
            .header(SIGNATURE_HEADER, &signed.signature)
            .body(signed.payload)
            .send()
            .await?;

        ensure_success(response).await
    }
}

#[async_trait]
impl Exchange for CoinDcxClient {
    async fn get_balance(&self, currency: &str, decimal_places: u32) -> Result<Option<Decimal>> {
        let body = TimestampBody {
            timestamp: now_millis(),
        };
        let response = self.signed_post(BALANCES_PATH, &body).await?;
        let entries: Vec<BalanceEntry> = decode(response, "balances").await?;

        let Some(entry) = entries.into_iter().find(|e| e.currency == currency) else {
            tracing::debug!(currency, "currency not present in balances");
            return Ok(None);
        };

        let raw = match &entry.balance {
            Value::String(s) => s.clone(),
            other => value_to_decimal(other)
                .map(|d| d.to_string())
                .ok_or_else(|| {
                    BotError::DataShape(format!("balance for {} is not a number", currency))
                })?,
        };

        truncate_decimal_str(&raw, decimal_places).map(Some)
    }

    async fn get_price(&self, market: &str, side: PriceSide) -> Result<Option<Decimal>> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, TICKER_PATH))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let tickers: Vec<TickerEntry> = decode(response, "ticker").await?;

        let Some(ticker) = tickers.into_iter().find(|t| t.market == market) else {
            tracing::debug!(market, "market not present in ticker");
            return Ok(None);
        };

        let raw = match side {
            PriceSide::Ask => ticker.ask,
            PriceSide::Bid => ticker.bid,
        };
        Ok(raw.as_ref().and_then(value_to_decimal))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult> {
        let body = CreateOrderBody {
            side: order.side,
            order_type: order.order_type,
            market: &order.market,
            price_per_unit: order.price,
            total_quantity: order.quantity,
            timestamp: now_millis(),
        };

        let response = self.signed_post(CREATE_ORDER_PATH, &body).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(OrderResult { status, body })
    }
}
