//! Binance API client for recent OHLC bars
//! No API key needed for public market data endpoints.

mod client;
mod types;

pub use client::{BinanceClient, BINANCE_API_BASE, MAX_KLINES_PER_REQUEST};
pub use types::*;
