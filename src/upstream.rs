//! Upstream exchange client.
//!
//! Two read calls are consumed from Binance's public REST API: the full
//! instrument listing (`/api/v3/exchangeInfo`) and kline bars for one
//! symbol/interval/time-window (`/api/v3/klines`). The [`Upstream`] trait is
//! the seam the catalog and history assembler are written against, so tests
//! can substitute a scripted exchange.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// Read-only view of the upstream exchange.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Current trading rules and symbol listing.
    async fn exchange_info(&self) -> Result<Vec<Instrument>, Error>;

    /// Kline bars for one symbol and interval. `start_ms`/`end_ms` bound the
    /// bar open times (inclusive, epoch milliseconds); when `start_ms` is
    /// absent the exchange returns the most recent bars up to `end_ms`.
    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        limit: u32,
    ) -> Result<Vec<KlineRow>, Error>;
}

/// One instrument from the upstream listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub status: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// One entry of an instrument's `filters` array. Only the price filter's
/// tick size is of interest; other filter types deserialize with
/// `tick_size: None`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    #[serde(default)]
    pub tick_size: Option<Decimal>,
}

impl Instrument {
    pub fn is_tradable(&self) -> bool {
        self.status == "TRADING"
    }

    /// Price tick size from the PRICE_FILTER entry, when present.
    pub fn tick_size(&self) -> Option<Decimal> {
        self.filters
            .iter()
            .find(|filter| filter.filter_type == "PRICE_FILTER")
            .and_then(|filter| filter.tick_size)
    }
}

/// One kline row, already lifted out of the positional array layout the
/// exchange uses on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRow {
    pub open_time_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<Instrument>,
}

/// Binance public REST client.
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    /// Build a client against `base_url` with a per-request timeout applied
    /// to every upstream call.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(e.into()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Issue one GET and decode the body, surfacing Binance's in-body error
    /// convention (`{"code": .., "msg": ..}`) as an upstream failure.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, Error> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("invalid JSON from {path}: {e}")))?;

        // Binance reports API-level errors inside a 2xx body as well.
        if let (Some(code), Some(msg)) = (
            body.get("code").and_then(Value::as_i64),
            body.get("msg").and_then(Value::as_str),
        ) {
            return Err(Error::Upstream {
                code: Some(code),
                message: msg.to_string(),
            });
        }

        if !status.is_success() {
            return Err(Error::upstream(format!("{path} returned HTTP {status}")));
        }

        Ok(body)
    }
}

#[async_trait]
impl Upstream for BinanceClient {
    async fn exchange_info(&self) -> Result<Vec<Instrument>, Error> {
        let body = self.get_json("/api/v3/exchangeInfo", &[]).await?;
        let info: ExchangeInfo = serde_json::from_value(body)
            .map_err(|e| Error::upstream(format!("malformed exchangeInfo: {e}")))?;
        Ok(info.symbols)
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        limit: u32,
    ) -> Result<Vec<KlineRow>, Error> {
        let mut query = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(start) = start_ms {
            query.push(("startTime", start.to_string()));
        }
        if let Some(end) = end_ms {
            query.push(("endTime", end.to_string()));
        }

        let body = self.get_json("/api/v3/klines", &query).await?;
        let rows = body
            .as_array()
            .ok_or_else(|| Error::upstream("klines response is not an array"))?;

        rows.iter().map(parse_kline_row).collect()
    }
}

/// Lift one positional kline row into a [`KlineRow`].
///
/// Layout: `[open time, open, high, low, close, volume, close time, ...]`
/// with prices and volume as decimal strings. Trailing fields are ignored.
fn parse_kline_row(row: &Value) -> Result<KlineRow, Error> {
    let fields = row
        .as_array()
        .ok_or_else(|| Error::upstream("kline row is not an array"))?;

    let open_time_ms = fields
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::upstream("kline row missing open time"))?;

    let decimal_at = |index: usize, name: &str| -> Result<Decimal, Error> {
        fields
            .get(index)
            .and_then(Value::as_str)
            .and_then(|text| text.parse::<Decimal>().ok())
            .ok_or_else(|| Error::upstream(format!("kline row missing {name}")))
    };

    Ok(KlineRow {
        open_time_ms,
        open: decimal_at(1, "open")?,
        high: decimal_at(2, "high")?,
        low: decimal_at(3, "low")?,
        close: decimal_at(4, "close")?,
        volume: decimal_at(5, "volume")?,
    })
}
