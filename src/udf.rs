//! The UDF facade: the four datafeed operations consumed by the routing
//! layer, plus the wire shapes specific to the UDF protocol.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::catalog::{SymbolCatalog, SymbolInfoBulk, UdfSymbolInfo};
use crate::error::Error;
use crate::history::{History, HistoryAssembler};
use crate::resolution;
use crate::upstream::Upstream;

/// UDF datafeed configuration, served by `/config`.
#[derive(Debug, Serialize)]
pub struct UdfConfig {
    pub supported_resolutions: Vec<String>,
    pub supports_group_request: bool,
    pub supports_marks: bool,
    pub supports_search: bool,
    pub supports_timescale_marks: bool,
    pub supports_time: bool,
}

impl Default for UdfConfig {
    fn default() -> Self {
        Self {
            supported_resolutions: resolution::supported_tokens(),
            supports_group_request: false,
            supports_marks: false,
            supports_search: true,
            supports_timescale_marks: false,
            supports_time: true,
        }
    }
}

/// UDF history response: parallel arrays on success, a bare status with an
/// optional `nextTime` hint when the window holds no data.
#[derive(Debug, Serialize)]
#[serde(tag = "s")]
pub enum HistoryResponse {
    #[serde(rename = "ok")]
    Ok {
        t: Vec<i64>,
        o: Vec<f64>,
        h: Vec<f64>,
        l: Vec<f64>,
        c: Vec<f64>,
        v: Vec<f64>,
    },
    #[serde(rename = "no_data")]
    NoData {
        #[serde(rename = "nextTime", skip_serializing_if = "Option::is_none")]
        next_time: Option<i64>,
    },
}

impl From<History> for HistoryResponse {
    fn from(history: History) -> Self {
        match history {
            History::Ok(bars) => {
                let as_f64 = |d: rust_decimal::Decimal| d.to_f64().unwrap_or(0.0);
                HistoryResponse::Ok {
                    t: bars.iter().map(|bar| bar.time).collect(),
                    o: bars.iter().map(|bar| as_f64(bar.open)).collect(),
                    h: bars.iter().map(|bar| as_f64(bar.high)).collect(),
                    l: bars.iter().map(|bar| as_f64(bar.low)).collect(),
                    c: bars.iter().map(|bar| as_f64(bar.close)).collect(),
                    v: bars.iter().map(|bar| as_f64(bar.volume)).collect(),
                }
            }
            History::NoData { next_time } => HistoryResponse::NoData { next_time },
        }
    }
}

/// Composes the symbol catalog and history assembler into the four UDF
/// operations. Pure composition; errors pass through untouched.
pub struct UdfAdapter {
    catalog: Arc<SymbolCatalog>,
    assembler: HistoryAssembler,
}

impl UdfAdapter {
    pub fn new(upstream: Arc<dyn Upstream>, catalog_ttl: Duration) -> Self {
        let catalog = Arc::new(SymbolCatalog::new(Arc::clone(&upstream), catalog_ttl));
        let assembler = HistoryAssembler::new(upstream, Arc::clone(&catalog));
        Self { catalog, assembler }
    }

    /// Bulk columnar symbol metadata.
    pub async fn symbol_info(&self) -> Result<SymbolInfoBulk, Error> {
        self.catalog.symbol_info_bulk().await
    }

    /// Single-symbol lookup by ticker.
    pub async fn symbol(&self, ticker: &str) -> Result<UdfSymbolInfo, Error> {
        self.catalog.lookup(ticker).await
    }

    /// Symbol search with optional type/exchange filters.
    pub async fn search(
        &self,
        query: &str,
        type_filter: Option<&str>,
        exchange_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<UdfSymbolInfo>, Error> {
        self.catalog
            .search(query, type_filter, exchange_filter, limit)
            .await
    }

    /// Candle history over `[from, to]` at a UDF resolution.
    pub async fn history(
        &self,
        symbol: &str,
        from: i64,
        to: i64,
        resolution: &str,
    ) -> Result<HistoryResponse, Error> {
        let history = self.assembler.fetch(symbol, resolution, from, to).await?;
        Ok(HistoryResponse::from(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Bar;
    use rust_decimal_macros::dec;

    #[test]
    fn ok_history_serializes_as_parallel_arrays() {
        let response = HistoryResponse::from(History::Ok(vec![
            Bar {
                time: 60,
                open: dec!(1.5),
                high: dec!(2),
                low: dec!(1),
                close: dec!(1.75),
                volume: dec!(10),
            },
            Bar {
                time: 120,
                open: dec!(1.75),
                high: dec!(2.5),
                low: dec!(1.5),
                close: dec!(2),
                volume: dec!(4),
            },
        ]));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["s"], "ok");
        assert_eq!(json["t"], serde_json::json!([60, 120]));
        assert_eq!(json["o"], serde_json::json!([1.5, 1.75]));
        assert_eq!(json["v"], serde_json::json!([10.0, 4.0]));
    }

    #[test]
    fn no_data_omits_next_time_when_absent() {
        let without = serde_json::to_value(HistoryResponse::from(History::NoData {
            next_time: None,
        }))
        .unwrap();
        assert_eq!(without["s"], "no_data");
        assert!(without.get("nextTime").is_none());

        let with = serde_json::to_value(HistoryResponse::from(History::NoData {
            next_time: Some(1_700_000_000),
        }))
        .unwrap();
        assert_eq!(with["nextTime"], 1_700_000_000);
    }

    #[test]
    fn config_advertises_the_supported_resolutions() {
        let config = UdfConfig::default();
        assert!(config.supports_search);
        assert!(config.supports_time);
        assert!(!config.supports_group_request);
        assert!(config.supported_resolutions.iter().any(|t| t == "60"));
        assert!(config.supported_resolutions.iter().any(|t| t == "D"));
    }
}
