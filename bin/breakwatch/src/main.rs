use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, DisabledNotifier, Notifier};
use engine::{
    BinanceClient, Delivery, Fetcher, Poller, ReportReceiver, RetryPolicy, SignalGate, SystemClock,
};
use strategy::{BreakoutStrategy, Strategy, StrategyParams};
use telegram_notify::TelegramNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid configuration")?;
    info!(
        symbols = ?cfg.symbols,
        timeframe = %cfg.timeframe,
        interval = ?cfg.poll_interval,
        "Breakwatch starting"
    );

    let params = match &cfg.strategy_config_path {
        Some(path) => StrategyParams::load(path)
            .with_context(|| format!("failed to load strategy parameters from {path}"))?,
        None => StrategyParams::default(),
    };
    params.validate().context("invalid strategy parameters")?;
    let strategy: Arc<dyn Strategy> = Arc::new(BreakoutStrategy::new(params.clone()));

    // ── Market data ───────────────────────────────────────────────────────────
    let clock = Arc::new(SystemClock);
    let client = BinanceClient::new(&cfg.binance_base_url)?;
    let fetcher = Fetcher::new(
        Arc::new(client),
        clock.clone(),
        RetryPolicy {
            attempts: cfg.fetch_retries,
            delay: cfg.fetch_retry_delay,
        },
        cfg.fetch_limit,
    );

    // ── Alerts ────────────────────────────────────────────────────────────────
    let notifier: Arc<dyn Notifier> = match &cfg.telegram {
        Some(tg) => {
            let telegram = TelegramNotifier::new(tg)?;
            if tg.test_on_start && !telegram.test_connection().await {
                warn!("Telegram connection test failed; alerts may not be delivered");
            }
            info!("Telegram alerts enabled");
            Arc::new(telegram)
        }
        None => {
            info!("TELEGRAM_TOKEN / TELEGRAM_CHAT_ID not set, alerts disabled");
            Arc::new(DisabledNotifier)
        }
    };

    // ── Scheduler ─────────────────────────────────────────────────────────────
    let (poller, handle) = Poller::new(
        cfg.symbols.clone(),
        cfg.timeframe,
        cfg.poll_interval,
        fetcher,
        strategy.clone(),
        notifier.clone(),
        clock,
        SignalGate::new(cfg.duplicate_policy),
    );

    // ── Dashboard ─────────────────────────────────────────────────────────────
    if let Some(dash) = &cfg.dashboard {
        let state = api::AppState {
            poller: handle.clone(),
            dashboard_token: dash.token.clone(),
            settings: Arc::new(api::RuntimeSettings {
                symbols: cfg.symbols.clone(),
                timeframe: cfg.timeframe,
                poll_interval_secs: cfg.poll_interval.as_secs(),
                strategy: strategy.name().to_string(),
                params,
                duplicate_policy: cfg.duplicate_policy,
                alerts_enabled: notifier.is_enabled(),
            }),
        };
        let port = dash.port;
        tokio::spawn(async move {
            if let Err(e) = api::serve(state, port).await {
                error!(error = %e, "Dashboard API stopped");
            }
        });
    }

    // ── Spawn ─────────────────────────────────────────────────────────────────
    tokio::spawn(render(handle.subscribe()));
    let poller_task = tokio::spawn(poller.run());

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("Shutdown signal received");
    handle.shutdown();
    poller_task.await.context("poller task panicked")?;
    Ok(())
}

/// Console view: one line per symbol and one per signal for every cycle.
async fn render(mut reports: ReportReceiver) {
    while reports.changed().await.is_ok() {
        let Some(report) = reports.borrow_and_update().clone() else {
            continue;
        };
        info!(
            cycle = report.cycle,
            timeframe = %report.timeframe,
            failed = report.failed_symbols(),
            "Cycle complete"
        );
        for symbol in &report.symbols {
            info!("{}", symbol.summary());
        }
        for symbol in &report.symbols {
            let Some(signal) = symbol.signal() else {
                continue;
            };
            match symbol.delivery() {
                Some(Delivery::Failed) => warn!("{signal} (alert not delivered)"),
                Some(Delivery::Duplicate) => info!("{signal} (already alerted)"),
                _ => info!("{signal}"),
            }
        }
    }
}
