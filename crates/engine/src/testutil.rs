//! In-memory collaborators shared by the engine's unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;

use common::{Bar, CandleSource, Error, Notifier, Result, Series, Timeframe};

use crate::clock::Clock;

/// Flat market at 100, a spike to 101 at index 50, and a high-volume close
/// at 101.2 on the final bar. Fires under `BreakoutLevel::Prior`.
pub fn breakout_series(symbol: &str, timeframe: Timeframe) -> Series {
    let mut bars: Vec<Bar> = (0..60)
        .map(|i| Bar {
            timestamp: Utc.timestamp_opt(i * 900, 0).unwrap(),
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 10.0,
        })
        .collect();
    bars[50].high = 101.0;
    bars[50].close = 101.0;
    bars[59].high = 101.2;
    bars[59].close = 101.2;
    bars[59].volume = 40.0;
    Series::new(symbol, timeframe, bars).unwrap()
}

/// Flat market, never fires.
pub fn quiet_series(symbol: &str, timeframe: Timeframe) -> Series {
    let bars = (0..60)
        .map(|i| Bar {
            timestamp: Utc.timestamp_opt(i * 900, 0).unwrap(),
            open: 100.0,
            high: 100.5,
            low: 99.5,
            close: 100.0,
            volume: 10.0,
        })
        .collect();
    Series::new(symbol, timeframe, bars).unwrap()
}

/// Candle source that replays scripted responses per symbol. Once a script is
/// exhausted the fallback (if any) is served forever.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Result<Series>>>>,
    fallback: Mutex<HashMap<String, Series>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn push(&self, symbol: &str, response: Result<Series>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn always(&self, symbol: &str, series: Series) {
        self.fallback
            .lock()
            .unwrap()
            .insert(symbol.to_string(), series);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleSource for ScriptedSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        _limit: usize,
    ) -> Result<Series> {
        self.calls.lock().unwrap().push(symbol.to_string());
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(response) => response,
            None => self
                .fallback
                .lock()
                .unwrap()
                .get(symbol)
                .cloned()
                .ok_or_else(|| Error::Http(format!("no route to {symbol}"))),
        }
    }
}

/// Notifier that records every message and answers with a switchable result.
pub struct RecordingNotifier {
    accept: AtomicBool,
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new(accept: bool) -> Self {
        Self {
            accept: AtomicBool::new(accept),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> bool {
        self.messages.lock().unwrap().push(message.to_string());
        self.accept.load(Ordering::SeqCst)
    }
}

/// Clock whose sleeps are recorded and either return at once or wait for a
/// tick from the test.
pub struct FakeClock {
    now: DateTime<Utc>,
    slept: Mutex<Vec<Duration>>,
    ticks: Option<tokio::sync::Mutex<mpsc::UnboundedReceiver<()>>>,
}

impl FakeClock {
    pub fn instant() -> Self {
        Self {
            now: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            slept: Mutex::new(Vec::new()),
            ticks: None,
        }
    }

    pub fn manual() -> (Self, mpsc::UnboundedSender<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = Self {
            ticks: Some(tokio::sync::Mutex::new(rx)),
            ..Self::instant()
        };
        (clock, tx)
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
        if let Some(ticks) = &self.ticks {
            if ticks.lock().await.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
    }
}
