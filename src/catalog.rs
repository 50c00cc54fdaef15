//! Symbol catalog: the UDF-facing view of the upstream instrument listing.
//!
//! The catalog is an immutable snapshot built wholesale from
//! `exchangeInfo`, swapped atomically on rebuild. Readers share the current
//! `Arc<CatalogSnapshot>` and never observe a partial build; a failed
//! rebuild keeps the previous snapshot in service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::error::Error;
use crate::resolution;
use crate::upstream::{Instrument, Upstream};

/// Default result cap for symbol search, per UDF convention.
pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// Exchange tag served in symbol metadata and matched by search filters.
pub const EXCHANGE: &str = "BINANCE";

/// Asset-class tag; every listed instrument is a crypto pair.
pub const SYMBOL_TYPE: &str = "crypto";

const SESSION: &str = "24x7";
const TIMEZONE: &str = "Etc/UTC";
const DEFAULT_PRICESCALE: u64 = 100_000_000;

/// UDF symbol metadata for one tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UdfSymbolInfo {
    pub symbol: String,
    pub ticker: String,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub exchange: String,
    pub listed_exchange: String,
    #[serde(rename = "type")]
    pub symbol_type: String,
    pub currency_code: String,
    pub session: String,
    pub timezone: String,
    pub minmov: u32,
    pub minmov2: u32,
    pub pricescale: u64,
    pub has_intraday: bool,
    pub has_daily: bool,
    pub has_weekly_and_monthly: bool,
    pub supported_resolutions: Vec<String>,
    pub data_status: String,
}

impl UdfSymbolInfo {
    fn from_instrument(instrument: &Instrument) -> Self {
        let symbol = instrument.symbol.clone();
        Self {
            ticker: symbol.clone(),
            name: symbol.clone(),
            full_name: symbol.clone(),
            description: format!("{}/{}", instrument.base_asset, instrument.quote_asset),
            exchange: EXCHANGE.to_string(),
            listed_exchange: EXCHANGE.to_string(),
            symbol_type: SYMBOL_TYPE.to_string(),
            currency_code: instrument.quote_asset.clone(),
            session: SESSION.to_string(),
            timezone: TIMEZONE.to_string(),
            minmov: 1,
            minmov2: 0,
            pricescale: pricescale_from_tick(instrument.tick_size()),
            has_intraday: true,
            has_daily: true,
            has_weekly_and_monthly: true,
            supported_resolutions: resolution::supported_tokens(),
            data_status: "streaming".to_string(),
            symbol,
        }
    }
}

/// Price scale from the instrument's tick size: a tick of `0.01` means two
/// decimal places, i.e. a pricescale of 100.
fn pricescale_from_tick(tick_size: Option<Decimal>) -> u64 {
    match tick_size {
        Some(tick) if tick > Decimal::ZERO => (Decimal::ONE / tick)
            .round()
            .to_u64()
            .unwrap_or(DEFAULT_PRICESCALE),
        _ => DEFAULT_PRICESCALE,
    }
}

/// Columnar symbol-info response: one array per UDF field, symbols in
/// catalog order.
#[derive(Debug, Serialize)]
pub struct SymbolInfoBulk {
    pub s: String,
    pub symbol: Vec<String>,
    pub ticker: Vec<String>,
    pub name: Vec<String>,
    pub full_name: Vec<String>,
    pub description: Vec<String>,
    pub exchange: Vec<String>,
    pub listed_exchange: Vec<String>,
    #[serde(rename = "type")]
    pub symbol_type: Vec<String>,
    pub currency_code: Vec<String>,
    pub session: Vec<String>,
    pub timezone: Vec<String>,
    pub minmov: Vec<u32>,
    pub minmov2: Vec<u32>,
    pub pricescale: Vec<u64>,
    pub has_intraday: Vec<bool>,
    pub has_daily: Vec<bool>,
    pub has_weekly_and_monthly: Vec<bool>,
    pub supported_resolutions: Vec<Vec<String>>,
    pub data_status: Vec<String>,
}

/// One immutable catalog build: all tradable symbols in upstream listing
/// order, with a ticker index for exact lookup.
pub struct CatalogSnapshot {
    built_at: Instant,
    symbols: Vec<UdfSymbolInfo>,
    index: HashMap<String, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot from an upstream instrument listing, keeping only
    /// tradable instruments and preserving their order.
    pub fn from_instruments(instruments: &[Instrument]) -> Self {
        let symbols: Vec<UdfSymbolInfo> = instruments
            .iter()
            .filter(|instrument| instrument.is_tradable())
            .map(UdfSymbolInfo::from_instrument)
            .collect();

        let index = symbols
            .iter()
            .enumerate()
            .map(|(position, info)| (info.ticker.clone(), position))
            .collect();

        Self {
            built_at: Instant::now(),
            symbols,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.built_at.elapsed() >= ttl
    }

    /// Exact-match lookup by ticker.
    pub fn lookup(&self, ticker: &str) -> Result<&UdfSymbolInfo, Error> {
        self.index
            .get(ticker)
            .map(|&position| &self.symbols[position])
            .ok_or(Error::SymbolNotFound)
    }

    /// Case-insensitive substring search over ticker and description,
    /// optionally filtered by type/exchange tag, truncated to `limit` in
    /// catalog order. An empty query matches everything.
    pub fn search(
        &self,
        query: &str,
        type_filter: Option<&str>,
        exchange_filter: Option<&str>,
        limit: usize,
    ) -> Vec<UdfSymbolInfo> {
        let needle = query.to_lowercase();

        self.symbols
            .iter()
            .filter(|info| {
                type_filter.is_none_or(|wanted| wanted == info.symbol_type)
                    && exchange_filter.is_none_or(|wanted| wanted == info.exchange)
            })
            .filter(|info| {
                needle.is_empty()
                    || info.ticker.to_lowercase().contains(&needle)
                    || info.description.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// The parallel-array response served by the bulk symbol-info endpoint.
    pub fn symbol_info_bulk(&self) -> SymbolInfoBulk {
        SymbolInfoBulk {
            s: "ok".to_string(),
            symbol: self.symbols.iter().map(|i| i.symbol.clone()).collect(),
            ticker: self.symbols.iter().map(|i| i.ticker.clone()).collect(),
            name: self.symbols.iter().map(|i| i.name.clone()).collect(),
            full_name: self.symbols.iter().map(|i| i.full_name.clone()).collect(),
            description: self.symbols.iter().map(|i| i.description.clone()).collect(),
            exchange: self.symbols.iter().map(|i| i.exchange.clone()).collect(),
            listed_exchange: self
                .symbols
                .iter()
                .map(|i| i.listed_exchange.clone())
                .collect(),
            symbol_type: self.symbols.iter().map(|i| i.symbol_type.clone()).collect(),
            currency_code: self
                .symbols
                .iter()
                .map(|i| i.currency_code.clone())
                .collect(),
            session: self.symbols.iter().map(|i| i.session.clone()).collect(),
            timezone: self.symbols.iter().map(|i| i.timezone.clone()).collect(),
            minmov: self.symbols.iter().map(|i| i.minmov).collect(),
            minmov2: self.symbols.iter().map(|i| i.minmov2).collect(),
            pricescale: self.symbols.iter().map(|i| i.pricescale).collect(),
            has_intraday: self.symbols.iter().map(|i| i.has_intraday).collect(),
            has_daily: self.symbols.iter().map(|i| i.has_daily).collect(),
            has_weekly_and_monthly: self
                .symbols
                .iter()
                .map(|i| i.has_weekly_and_monthly)
                .collect(),
            supported_resolutions: self
                .symbols
                .iter()
                .map(|i| i.supported_resolutions.clone())
                .collect(),
            data_status: self.symbols.iter().map(|i| i.data_status.clone()).collect(),
        }
    }
}

/// Owns the current snapshot and its rebuild policy: built lazily on first
/// use, rebuilt once it is older than the TTL, rebuilds serialized so only
/// one upstream listing fetch runs at a time.
pub struct SymbolCatalog {
    upstream: Arc<dyn Upstream>,
    ttl: Duration,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
    rebuild: Mutex<()>,
}

impl SymbolCatalog {
    pub fn new(upstream: Arc<dyn Upstream>, ttl: Duration) -> Self {
        Self {
            upstream,
            ttl,
            current: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// The current snapshot, building or refreshing it first if needed.
    pub async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, Error> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let _guard = self.rebuild.lock().await;

        // Another task may have finished a rebuild while we waited.
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        match self.build().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.current.write().await = Some(Arc::clone(&snapshot));
                tracing::info!(symbols = snapshot.len(), "symbol catalog rebuilt");
                Ok(snapshot)
            }
            Err(err) => match self.current.read().await.as_ref() {
                Some(previous) => {
                    tracing::warn!(%err, "catalog rebuild failed, serving previous snapshot");
                    Ok(Arc::clone(previous))
                }
                None => Err(err),
            },
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|snapshot| !snapshot.is_stale(self.ttl))
            .map(Arc::clone)
    }

    async fn build(&self) -> Result<CatalogSnapshot, Error> {
        let instruments = self.upstream.exchange_info().await?;
        Ok(CatalogSnapshot::from_instruments(&instruments))
    }

    pub async fn lookup(&self, ticker: &str) -> Result<UdfSymbolInfo, Error> {
        Ok(self.snapshot().await?.lookup(ticker)?.clone())
    }

    pub async fn search(
        &self,
        query: &str,
        type_filter: Option<&str>,
        exchange_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<UdfSymbolInfo>, Error> {
        Ok(self
            .snapshot()
            .await?
            .search(query, type_filter, exchange_filter, limit))
    }

    pub async fn symbol_info_bulk(&self) -> Result<SymbolInfoBulk, Error> {
        Ok(self.snapshot().await?.symbol_info_bulk())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instrument(symbol: &str, base: &str, quote: &str, status: &str) -> Instrument {
        serde_json::from_value(json!({
            "symbol": symbol,
            "baseAsset": base,
            "quoteAsset": quote,
            "status": status,
            "filters": [{"filterType": "PRICE_FILTER", "tickSize": "0.01000000"}]
        }))
        .unwrap()
    }

    fn sample_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_instruments(&[
            instrument("BTCUSDT", "BTC", "USDT", "TRADING"),
            instrument("ETHUSDT", "ETH", "USDT", "TRADING"),
            instrument("ETHBTC", "ETH", "BTC", "TRADING"),
            instrument("LUNAUSDT", "LUNA", "USDT", "BREAK"),
            instrument("SOLUSDT", "SOL", "USDT", "TRADING"),
            instrument("WBTCBTC", "WBTC", "BTC", "TRADING"),
            instrument("DOGEUSDT", "DOGE", "USDT", "TRADING"),
        ])
    }

    #[test]
    fn non_tradable_instruments_are_filtered_out() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.len(), 6);
        assert!(matches!(
            snapshot.lookup("LUNAUSDT"),
            Err(Error::SymbolNotFound)
        ));
    }

    #[test]
    fn lookup_returns_matching_ticker() {
        let snapshot = sample_snapshot();
        let info = snapshot.lookup("ETHUSDT").unwrap();
        assert_eq!(info.ticker, "ETHUSDT");
        assert_eq!(info.description, "ETH/USDT");
        assert_eq!(info.currency_code, "USDT");
        assert_eq!(info.pricescale, 100);
    }

    #[test]
    fn lookup_for_unknown_ticker_fails() {
        let snapshot = sample_snapshot();
        assert!(matches!(
            snapshot.lookup("XMRUSDT"),
            Err(Error::SymbolNotFound)
        ));
    }

    #[test]
    fn empty_query_matches_everything_bounded_by_limit() {
        let snapshot = sample_snapshot();
        let results = snapshot.search("", None, None, 5);
        assert_eq!(results.len(), 5);
        // Catalog order is upstream listing order.
        assert_eq!(results[0].ticker, "BTCUSDT");
        assert_eq!(results[1].ticker, "ETHUSDT");
    }

    #[test]
    fn search_matches_ticker_and_description_case_insensitively() {
        let snapshot = sample_snapshot();
        let results = snapshot.search("btc", None, None, DEFAULT_SEARCH_LIMIT);
        let tickers: Vec<&str> = results.iter().map(|i| i.ticker.as_str()).collect();
        assert_eq!(tickers, ["BTCUSDT", "ETHBTC", "WBTCBTC"]);

        for info in &results {
            let matched = info.ticker.to_lowercase().contains("btc")
                || info.description.to_lowercase().contains("btc");
            assert!(matched);
        }
    }

    #[test]
    fn search_filters_by_type_and_exchange_tags() {
        let snapshot = sample_snapshot();
        assert_eq!(
            snapshot.search("", Some("crypto"), Some("BINANCE"), 100).len(),
            6
        );
        assert!(snapshot.search("", Some("stock"), None, 100).is_empty());
        assert!(snapshot.search("", None, Some("NASDAQ"), 100).is_empty());
    }

    #[test]
    fn bulk_response_is_columnar_in_catalog_order() {
        let snapshot = sample_snapshot();
        let bulk = snapshot.symbol_info_bulk();
        assert_eq!(bulk.s, "ok");
        assert_eq!(bulk.ticker.len(), snapshot.len());
        assert_eq!(bulk.description.len(), snapshot.len());
        assert_eq!(bulk.pricescale.len(), snapshot.len());
        assert_eq!(bulk.ticker[0], "BTCUSDT");
        assert_eq!(bulk.description[0], "BTC/USDT");
        assert!(bulk.has_intraday.iter().all(|&flag| flag));
    }

    #[test]
    fn pricescale_defaults_when_tick_size_is_absent() {
        assert_eq!(pricescale_from_tick(None), DEFAULT_PRICESCALE);
        assert_eq!(
            pricescale_from_tick(Some(Decimal::ZERO)),
            DEFAULT_PRICESCALE
        );
        assert_eq!(pricescale_from_tick(Some("0.00100000".parse().unwrap())), 1_000);
    }
}
