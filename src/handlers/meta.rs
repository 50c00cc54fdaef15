use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use serde_json::{Value, json};

use crate::udf::UdfConfig;

pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Binance UDF Adapter for TradingView.",
        "documentation": "./config",
        "status": "success"
    }))
}

/// Current server time in epoch seconds, as plain text per UDF convention.
pub async fn server_time() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

pub async fn config() -> Json<UdfConfig> {
    Json(UdfConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn welcome_points_at_the_config_endpoint() {
        let Json(body) = welcome().await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["documentation"], "./config");
    }

    #[tokio::test]
    async fn server_time_is_epoch_seconds() {
        let text = server_time().await;
        let secs: u64 = text.parse().unwrap();
        // After 2020-01-01 and parseable: good enough for a clock read.
        assert!(secs > 1_577_836_800);
    }

    #[tokio::test]
    async fn config_lists_resolutions() {
        let Json(config) = config().await;
        assert!(!config.supported_resolutions.is_empty());
    }
}
