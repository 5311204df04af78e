pub mod binance;
pub mod clock;
pub mod fetcher;
pub mod gate;
pub mod poller;
pub mod report;

#[cfg(test)]
mod testutil;

pub use binance::BinanceClient;
pub use clock::{Clock, SystemClock};
pub use fetcher::{FetchFailure, Fetcher, RetryPolicy};
pub use gate::SignalGate;
pub use poller::{Poller, PollerHandle, ReportReceiver};
pub use report::{CycleReport, Delivery, SymbolOutcome, SymbolReport};
