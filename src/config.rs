use crate::error::BotError;
use crate::strategy::{StrategyState, Thresholds};
use crate::Result;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "rsibot";
const ENV_PREFIX: &str = "RSIBOT";

/// Flat variables of the legacy `.env` deployment, mapped onto config keys
const LEGACY_ENV: &[(&str, &str)] = &[
    ("key", "exchange.api_key"),
    ("secret", "exchange.api_secret"),
    ("SELLVALUE", "strategy.sell_value"),
    ("BUYVALUE", "strategy.buy_value"),
    ("DP", "market.quantity_decimal_places"),
    ("TICKER", "market.symbol"),
    ("COIN", "market.coin"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketSettings {
    /// Exchange market code, e.g. `BTCINR`
    #[serde(default)]
    pub symbol: String,
    /// Traded coin code, e.g. `BTC`
    #[serde(default)]
    pub coin: String,
    /// Quote currency used to pay for buys
    pub base_currency: String,
    pub quantity_decimal_places: u32,
    pub quote_decimal_places: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategySettings {
    pub sell_value: f64,
    pub buy_value: f64,
    pub arm_sell_at_start: bool,
    pub arm_buy_at_start: bool,
}

impl StrategySettings {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.sell_value, self.buy_value)
    }

    pub fn initial_state(&self) -> StrategyState {
        StrategyState {
            armed_to_sell: self.arm_sell_at_start,
            armed_to_buy: self.arm_buy_at_start,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorSettings {
    pub base_url: String,
    pub screener: String,
    /// Scanner ticker in `EXCHANGE:SYMBOL` form; falls back to the market symbol
    pub ticker: Option<String>,
    /// Timeframe in minutes, or `1D`/`1W`/`1M`
    pub interval: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Json,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    pub backend: HistoryBackend,
    pub path: String,
    pub redis_url: String,
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlSettings {
    pub poll_interval_secs: u64,
}

impl ControlSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "rsibot=info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub exchange: ExchangeSettings,
    pub market: MarketSettings,
    pub strategy: StrategySettings,
    pub indicator: IndicatorSettings,
    pub history: HistorySettings,
    pub control: ControlSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from defaults, an optional TOML file, `RSIBOT__*` variables
    /// and the legacy flat variables, in increasing precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = with_defaults(Config::builder())?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange.api_key.trim().is_empty() || self.exchange.api_secret.trim().is_empty() {
            return Err(BotError::Config("KEY NOT FOUND".into()));
        }
        if self.market.symbol.trim().is_empty() || self.market.coin.trim().is_empty() {
            return Err(BotError::Config("TICKER/COIN NOT FOUND".into()));
        }
        let s = &self.strategy;
        if !s.sell_value.is_finite() || !s.buy_value.is_finite() {
            return Err(BotError::Config(format!(
                "thresholds must be finite (sell={}, buy={})",
                s.sell_value, s.buy_value
            )));
        }
        if s.sell_value < s.buy_value {
            return Err(BotError::Config(format!(
                "sell threshold {} is below buy threshold {}",
                s.sell_value, s.buy_value
            )));
        }
        let ticker = self.indicator_ticker();
        if !ticker.contains(':') {
            return Err(BotError::Config(format!(
                "indicator ticker `{}` must be EXCHANGE:SYMBOL; set indicator.ticker",
                ticker
            )));
        }
        if self.control.poll_interval_secs == 0 {
            return Err(BotError::Config("poll interval must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Symbol handed to the indicator source
    pub fn indicator_ticker(&self) -> &str {
        self.indicator
            .ticker
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.market.symbol)
    }
}

fn with_defaults(
    builder: ConfigBuilder<config::builder::DefaultState>,
) -> Result<ConfigBuilder<config::builder::DefaultState>> {
    Ok(builder
        .set_default("exchange.base_url", "https://api.coindcx.com")?
        .set_default("exchange.timeout_secs", 30)?
        .set_default("market.base_currency", "INR")?
        .set_default("market.quantity_decimal_places", 8)?
        .set_default("market.quote_decimal_places", 2)?
        .set_default("strategy.sell_value", 70.0)?
        .set_default("strategy.buy_value", 30.0)?
        .set_default("strategy.arm_sell_at_start", false)?
        .set_default("strategy.arm_buy_at_start", false)?
        .set_default("indicator.base_url", "https://scanner.tradingview.com")?
        .set_default("indicator.screener", "crypto")?
        .set_default("indicator.interval", "5")?
        .set_default("indicator.timeout_secs", 30)?
        .set_default("history.backend", "json")?
        .set_default("history.path", "db.json")?
        .set_default("history.redis_url", "redis://127.0.0.1:6379")?
        .set_default("control.poll_interval_secs", 5)?
        .set_default("logging.filter", "rsibot=info")?
        .set_default("logging.json", false)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Result<Settings> {
        let builder = with_defaults(Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml));
        Settings::from_builder(builder)
    }

    const VALID: &str = r#"
        [exchange]
        api_key = "k"
        api_secret = "s"

        [market]
        symbol = "BTCINR"
        coin = "BTC"
        quantity_decimal_places = 4

        [strategy]
        sell_value = 65.5
        buy_value = 35

        [indicator]
        ticker = "WAZIRX:BTCINR"
    "#;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings = parse(VALID).unwrap();

        assert_eq!(settings.exchange.base_url, "https://api.coindcx.com");
        assert_eq!(settings.market.base_currency, "INR");
        assert_eq!(settings.market.quantity_decimal_places, 4);
        assert_eq!(settings.market.quote_decimal_places, 2);
        assert_eq!(settings.history.backend, HistoryBackend::Json);
        assert_eq!(settings.history.path, "db.json");
        assert_eq!(settings.control.poll_interval(), Duration::from_secs(5));
        assert_eq!(settings.strategy.thresholds(), Thresholds::new(65.5, 35.0));
        assert_eq!(settings.strategy.initial_state(), StrategyState::default());
        assert_eq!(settings.indicator_ticker(), "WAZIRX:BTCINR");
    }

    #[test]
    fn test_bare_market_symbol_is_not_a_scanner_ticker() {
        let toml = VALID.replace("ticker = \"WAZIRX:BTCINR\"", "");
        let err = parse(&toml).unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("`BTCINR` must be EXCHANGE:SYMBOL"));
    }

    #[test]
    fn test_missing_credentials_is_fatal() {
        let err = parse(
            r#"
            [market]
            symbol = "BTCINR"
            coin = "BTC"
        "#,
        )
        .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("KEY NOT FOUND"));
    }

    #[test]
    fn test_missing_symbol_is_fatal() {
        let err = parse(
            r#"
            [exchange]
            api_key = "k"
            api_secret = "s"
        "#,
        )
        .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("TICKER/COIN NOT FOUND"));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let toml = VALID.replace("sell_value = 65.5", "sell_value = 20");
        let err = parse(&toml).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_explicit_indicator_ticker_and_backend() {
        let toml = VALID.replace(
            "ticker = \"WAZIRX:BTCINR\"",
            "ticker = \"BINANCE:BTCUSDT\"\ninterval = \"15\"",
        ) + "\n[history]\nbackend = \"redis\"\n";
        let settings = parse(&toml).unwrap();
        assert_eq!(settings.indicator_ticker(), "BINANCE:BTCUSDT");
        assert_eq!(settings.indicator.interval, "15");
        assert_eq!(settings.history.backend, HistoryBackend::Redis);
    }
}
