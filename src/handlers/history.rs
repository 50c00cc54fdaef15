use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::error::Error;
use crate::handlers::symbols::{parse_positive, require};
use crate::state::AppState;
use crate::udf::HistoryResponse;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    symbol: Option<String>,
    from: Option<String>,
    to: Option<String>,
    resolution: Option<String>,
}

pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, Error> {
    let symbol = require(params.symbol, "symbol")?;
    let resolution = require(params.resolution, "resolution")?;
    let from = parse_timestamp(params.from, "from")?;
    let to = parse_timestamp(params.to, "to")?;

    Ok(Json(state.udf.history(&symbol, from, to, &resolution).await?))
}

fn parse_timestamp(value: Option<String>, name: &str) -> Result<i64, Error> {
    let raw = require(value, name)?;
    parse_positive(&raw, name)
}
