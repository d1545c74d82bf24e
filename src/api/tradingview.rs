use super::IndicatorSource;
use crate::config::IndicatorSettings;
use crate::error::BotError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Client for the TradingView screener, used as the RSI source
#[derive(Clone)]
pub struct TradingViewClient {
    client: Client,
    scan_url: String,
    column: String,
}

#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    symbols: ScanSymbols<'a>,
    columns: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct ScanSymbols<'a> {
    tickers: [&'a str; 1],
    query: ScanQuery,
}

#[derive(Debug, Serialize)]
struct ScanQuery {
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    s: String,
    d: Vec<Value>,
}

/// Screener column for RSI(14) on the given timeframe.
///
/// Intraday timeframes are suffixed with their minutes, the daily one is bare.
pub fn rsi_column(interval: &str) -> String {
    match interval.trim() {
        "" | "1D" | "D" => "RSI".to_string(),
        other => format!("RSI|{}", other),
    }
}

impl TradingViewClient {
    pub fn new(settings: &IndicatorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            scan_url: format!(
                "{}/{}/scan",
                settings.base_url.trim_end_matches('/'),
                settings.screener
            ),
            column: rsi_column(&settings.interval),
        })
    }
}

#[async_trait]
impl IndicatorSource for TradingViewClient {
    async fn fetch_rsi(&self, symbol: &str) -> Result<f64> {
        let request = ScanRequest {
            symbols: ScanSymbols {
                tickers: [symbol],
                query: ScanQuery { types: Vec::new() },
            },
            columns: [self.column.as_str()],
        };

        let response = self.client.post(&self.scan_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let scan: ScanResponse = serde_json::from_str(&text)
            .map_err(|e| BotError::DataShape(format!("scanner response: {}", e)))?;

        let row = scan
            .data
            .into_iter()
            .find(|row| row.s.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| BotError::DataShape(format!("no scanner row for {}", symbol)))?;

        let rsi = row
            .d
            .first()
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                BotError::DataShape(format!("{} has no {} value", symbol, self.column))
            })?;

        tracing::debug!(symbol, rsi, column = %self.column, "Fetched RSI");
        Ok(rsi)
    }
}
