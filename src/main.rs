use clap::Parser;
use rsibot::config::{LoggingSettings, Settings};
use rsibot::execution::{shutdown, LoopConfig, TradingLoop};
use rsibot::persistence;
use rsibot::strategy::HysteresisStrategy;
use rsibot::{CoinDcxClient, TradingViewClient};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RSI hysteresis trading agent
#[derive(Debug, Parser)]
#[command(name = "rsibot", version, about)]
struct Args {
    /// TOML config file (defaults to ./rsibot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            setup_logging(&LoggingSettings::default());
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };
    setup_logging(&settings.logging);

    tracing::info!("🚀 RSI Bot starting");
    log_configuration(&settings);

    // Initialize components
    let exchange = CoinDcxClient::new(&settings.exchange)?;
    let source = TradingViewClient::new(&settings.indicator)?;
    let history = persistence::open(&settings.history).await?;
    let strategy = HysteresisStrategy::new(
        settings.strategy.thresholds(),
        settings.strategy.initial_state(),
    );

    let mut trading_loop = TradingLoop::new(
        LoopConfig::from_settings(&settings),
        strategy,
        Box::new(source),
        Box::new(exchange),
        history,
    );

    if args.once {
        match trading_loop.run_cycle().await {
            Ok(report) => tracing::info!(
                rsi = report.rsi,
                trades = report.trades.len(),
                "Single cycle complete"
            ),
            Err(e) => tracing::error!(kind = ?e.kind(), "✗ Cycle failed: {}", e),
        }
        return Ok(());
    }

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
            trigger.trigger();
        }
    });

    tracing::info!("Strategy: {}", trading_loop.strategy().name());
    tracing::info!("Press Ctrl+C to stop...");
    trading_loop.run(shutdown).await;

    tracing::info!("👋 RSI Bot stopped");
    Ok(())
}

fn setup_logging(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn log_configuration(settings: &Settings) {
    tracing::info!("📊 Configuration:");
    tracing::info!(
        "  Market: {} ({} / {})",
        settings.market.symbol,
        settings.market.coin,
        settings.market.base_currency
    );
    tracing::info!(
        "  Indicator: {} on {}",
        settings.indicator_ticker(),
        settings.indicator.interval
    );
    tracing::info!("  SELLVALUE: {}", settings.strategy.sell_value);
    tracing::info!("  BUYVALUE: {}", settings.strategy.buy_value);
    tracing::info!(
        "  Armed at start: sell={} buy={}",
        settings.strategy.arm_sell_at_start,
        settings.strategy.arm_buy_at_start
    );
    tracing::info!("  Quantity precision: {} dp", settings.market.quantity_decimal_places);
    tracing::info!("  Poll interval: {}s", settings.control.poll_interval_secs);
    tracing::info!("  History: {:?}", settings.history.backend);
}
