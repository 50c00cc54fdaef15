use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::catalog::{DEFAULT_SEARCH_LIMIT, SymbolInfoBulk, UdfSymbolInfo};
use crate::error::Error;
use crate::state::AppState;

pub async fn symbol_info(State(state): State<AppState>) -> Result<Json<SymbolInfoBulk>, Error> {
    Ok(Json(state.udf.symbol_info().await?))
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    symbol: Option<String>,
}

pub async fn symbols(
    State(state): State<AppState>,
    Query(params): Query<SymbolQuery>,
) -> Result<Json<UdfSymbolInfo>, Error> {
    let symbol = require(params.symbol, "symbol")?;
    Ok(Json(state.udf.symbol(&symbol).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
    #[serde(rename = "type")]
    symbol_type: Option<String>,
    exchange: Option<String>,
    limit: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UdfSymbolInfo>>, Error> {
    // The query parameter must be present but may be empty (matches all).
    let query = params
        .query
        .ok_or_else(|| Error::BadRequest("Missing mandatory parameter: query".to_string()))?;

    // Front-ends send empty strings for unused filters; treat as absent.
    let symbol_type = params.symbol_type.filter(|value| !value.is_empty());
    let exchange = params.exchange.filter(|value| !value.is_empty());

    let limit = match params.limit.filter(|value| !value.is_empty()) {
        Some(raw) => parse_positive(&raw, "limit")? as usize,
        None => DEFAULT_SEARCH_LIMIT,
    };

    let results = state
        .udf
        .search(&query, symbol_type.as_deref(), exchange.as_deref(), limit)
        .await?;

    Ok(Json(results))
}

pub(super) fn require(value: Option<String>, name: &str) -> Result<String, Error> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::BadRequest(format!("Missing mandatory parameter: {name}")))
}

pub(super) fn parse_positive(raw: &str, name: &str) -> Result<i64, Error> {
    raw.parse::<i64>()
        .ok()
        .filter(|&value| value > 0)
        .ok_or_else(|| Error::BadRequest(format!("Invalid parameter: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_missing_and_empty_values() {
        assert!(require(Some("BTCUSDT".into()), "symbol").is_ok());
        assert!(matches!(require(None, "symbol"), Err(Error::BadRequest(_))));
        assert!(matches!(
            require(Some(String::new()), "symbol"),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn parse_positive_rejects_garbage_and_non_positive() {
        assert_eq!(parse_positive("30", "limit").unwrap(), 30);
        for raw in ["abc", "-5", "0", "1.5"] {
            assert!(matches!(
                parse_positive(raw, "limit"),
                Err(Error::BadRequest(_))
            ));
        }
    }
}
