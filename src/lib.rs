//! TradingView UDF datafeed adapter backed by the Binance public REST API.
//!
//! Translates UDF requests (symbol metadata, symbol search, candle history)
//! into Binance's symbol naming, interval vocabulary, and per-call kline
//! limits, and reshapes the answers into the fixed UDF JSON shapes.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)          core                        upstream
//! ─────────────        ─────────────────────       ──────────────
//! /config  ──────────▶ UdfAdapter
//! /symbols ──────────▶   ├── SymbolCatalog ──────▶ exchangeInfo
//! /search  ──────────▶   │     (snapshot, TTL)
//! /history ──────────▶   └── HistoryAssembler ───▶ klines (≤1000/call)
//!                              (chunk, stitch)
//! ```
//!
//! No history is stored or cached; every request is served live from the
//! upstream. The symbol catalog is the only shared state: an immutable
//! snapshot rebuilt wholesale and swapped atomically.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod history;
pub mod resolution;
pub mod router;
pub mod state;
pub mod udf;
pub mod upstream;

pub use error::Error;
