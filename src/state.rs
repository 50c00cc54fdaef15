use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Error;
use crate::udf::UdfAdapter;
use crate::upstream::BinanceClient;

#[derive(Clone)]
pub struct AppState {
    pub udf: Arc<UdfAdapter>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let upstream = Arc::new(BinanceClient::new(
            config.upstream_url.clone(),
            config.http_timeout,
        )?);

        Ok(Self {
            udf: Arc::new(UdfAdapter::new(upstream, config.catalog_ttl)),
        })
    }
}
