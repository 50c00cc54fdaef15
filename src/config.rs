//! Application configuration loaded from environment variables.
//!
//! - `UDF_BIND_ADDR` — listen address (default `0.0.0.0:3002`)
//! - `UDF_UPSTREAM_URL` — upstream REST base URL (default Binance public API)
//! - `UDF_CATALOG_TTL_SECS` — symbol catalog staleness threshold
//! - `UDF_HTTP_TIMEOUT_SECS` — per-request upstream timeout

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3002";
const DEFAULT_UPSTREAM_URL: &str = "https://api.binance.com";
const DEFAULT_CATALOG_TTL_SECS: u64 = 1_800;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub upstream_url: String,
    pub catalog_ttl: Duration,
    pub http_timeout: Duration,
}

impl AppConfig {
    /// Load the configuration, falling back to defaults for unset or empty
    /// variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = non_empty_var("UDF_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("UDF_BIND_ADDR is not a valid socket address")?;

        let upstream_url =
            non_empty_var("UDF_UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());

        let catalog_ttl = duration_var("UDF_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?;
        let http_timeout = duration_var("UDF_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            bind_addr,
            upstream_url,
            catalog_ttl,
            http_timeout,
        })
    }
}

fn duration_var(name: &str, default_secs: u64) -> anyhow::Result<Duration> {
    let secs = match non_empty_var(name) {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("{name} is not a valid number of seconds"))?,
        None => default_secs,
    };
    Ok(Duration::from_secs(secs))
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
