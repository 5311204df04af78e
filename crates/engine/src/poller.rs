use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::{error, info, warn};

use common::{Notifier, Signal, Timeframe};
use strategy::Strategy;

use crate::clock::Clock;
use crate::fetcher::Fetcher;
use crate::gate::SignalGate;
use crate::report::{CycleReport, Delivery, SymbolOutcome, SymbolReport};

/// Consecutive failed symbol fetches tolerated before the scheduler backs off.
pub const FAILURE_ESCALATION_THRESHOLD: u32 = 3;
/// Extra wait added to the poll interval once the threshold is exceeded.
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(10);

pub type ReportReceiver = watch::Receiver<Option<Arc<CycleReport>>>;

/// Cloneable handle for controlling a running `Poller` and reading its output.
#[derive(Clone)]
pub struct PollerHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
    refresh: Arc<Notify>,
    reports: ReportReceiver,
}

impl PollerHandle {
    /// Stop the loop. The in-flight cycle, if any, is allowed to finish.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the next cycle now instead of waiting for the interval.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Subscribe to cycle reports. Holds `None` until the first cycle ends.
    pub fn subscribe(&self) -> ReportReceiver {
        self.reports.clone()
    }

    pub fn latest(&self) -> Option<Arc<CycleReport>> {
        self.reports.borrow().clone()
    }
}

/// Fixed-interval scheduler: fetch → analyze → evaluate → notify, per symbol,
/// sequentially, then publish a `CycleReport` and wait.
pub struct Poller {
    symbols: Vec<String>,
    timeframe: Timeframe,
    interval: Duration,
    fetcher: Fetcher,
    strategy: Arc<dyn Strategy>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    gate: SignalGate,
    cycle: u64,
    consecutive_failures: u32,
    report_tx: watch::Sender<Option<Arc<CycleReport>>>,
    shutdown_rx: watch::Receiver<bool>,
    refresh: Arc<Notify>,
}

impl Poller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbols: Vec<String>,
        timeframe: Timeframe,
        interval: Duration,
        fetcher: Fetcher,
        strategy: Arc<dyn Strategy>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        gate: SignalGate,
    ) -> (Self, PollerHandle) {
        let (report_tx, reports) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresh = Arc::new(Notify::new());

        let handle = PollerHandle {
            shutdown_tx: Arc::new(shutdown_tx),
            refresh: refresh.clone(),
            reports,
        };

        let poller = Poller {
            symbols,
            timeframe,
            interval,
            fetcher,
            strategy,
            notifier,
            clock,
            gate,
            cycle: 0,
            consecutive_failures: 0,
            report_tx,
            shutdown_rx,
            refresh,
        };

        (poller, handle)
    }

    /// Run until `PollerHandle::shutdown` is called. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            symbols = ?self.symbols,
            timeframe = %self.timeframe,
            interval = ?self.interval,
            strategy = self.strategy.name(),
            duplicates = %self.gate.policy(),
            "Poller started"
        );

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            let report = Arc::new(self.run_cycle().await);
            self.report_tx.send_replace(Some(report));

            let mut wait = self.interval;
            if self.consecutive_failures > FAILURE_ESCALATION_THRESHOLD {
                error!(
                    failures = self.consecutive_failures,
                    cooldown = ?FAILURE_COOLDOWN,
                    "Persistent market data failures, backing off"
                );
                self.consecutive_failures = 0;
                wait += FAILURE_COOLDOWN;
            }

            tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                _ = self.clock.sleep(wait) => {}
                _ = self.refresh.notified() => {
                    info!("Manual refresh requested");
                }
            }
        }

        info!(cycles = self.cycle, "Poller stopped");
    }

    /// Run one cycle over every symbol and return its report.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let started_at = self.clock.now();

        let mut symbols = Vec::with_capacity(self.symbols.len());
        for symbol in self.symbols.clone() {
            symbols.push(self.process_symbol(symbol).await);
        }

        CycleReport {
            cycle: self.cycle,
            timeframe: self.timeframe,
            started_at,
            finished_at: self.clock.now(),
            symbols,
        }
    }

    async fn process_symbol(&mut self, symbol: String) -> SymbolReport {
        let series = match self.fetcher.fetch(&symbol, self.timeframe).await {
            Ok(series) => series,
            Err(failure) => {
                self.consecutive_failures += 1;
                warn!(
                    %symbol,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "No market data this cycle"
                );
                return SymbolReport {
                    symbol,
                    outcome: SymbolOutcome::FetchFailed {
                        attempts: failure.attempts,
                        error: failure.error.to_string(),
                    },
                };
            }
        };
        self.consecutive_failures = 0;

        let analysis = self.strategy.analyze(series);
        let signal = self.strategy.evaluate(&analysis);
        let delivery = match &signal {
            Some(signal) => Some(self.deliver(signal).await),
            None => None,
        };

        SymbolReport {
            symbol,
            outcome: SymbolOutcome::Analyzed {
                analysis,
                signal,
                delivery,
            },
        }
    }

    async fn deliver(&mut self, signal: &Signal) -> Delivery {
        info!(
            symbol = %signal.symbol,
            entry = signal.entry_price,
            stop = signal.stop_loss,
            tp1 = signal.take_profit_1,
            rsi = signal.rsi_at_signal,
            "BUY signal"
        );
        if !signal.has_positive_risk() {
            warn!(symbol = %signal.symbol, risk = signal.risk(), "Signal has non-positive risk");
        }

        if !self.gate.should_send(signal) {
            info!(symbol = %signal.symbol, bar = %signal.timestamp, "Duplicate signal suppressed");
            return Delivery::Duplicate;
        }
        if !self.notifier.is_enabled() {
            return Delivery::Skipped;
        }
        if self.notifier.notify_signal(signal).await {
            self.gate.record(signal);
            Delivery::Sent
        } else {
            warn!(symbol = %signal.symbol, "Signal alert could not be delivered");
            Delivery::Failed
        }
    }
}
