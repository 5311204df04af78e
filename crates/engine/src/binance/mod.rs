pub mod kline;
pub mod rest;

pub use kline::{parse_klines, KlineRow};
pub use rest::BinanceClient;
