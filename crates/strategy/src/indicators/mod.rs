//! Pure indicator functions over plain `f64` slices.
//!
//! Every function returns one output per input element. Leading positions
//! without enough history are `None`, never zero-filled.

pub mod ema;
pub mod levels;
pub mod rsi;

pub use ema::ema;
pub use levels::{resistance, rolling_max, rolling_mean, rolling_min, support};
pub use rsi::rsi;
