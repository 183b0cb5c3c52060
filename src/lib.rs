//! btcpulse - Bitcoin news and market-data sync with a read-only dashboard
//!
//! One scheduled invocation scrapes Bitcoin news articles, labels their
//! sentiment, fetches Binance candles incrementally, and writes both into a
//! local SQLite store after deduplication. The dashboard module is a pure
//! read-only projection over the same store.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod market;
pub mod scraping;
pub mod sentiment;
pub mod sync;
pub mod utils;
