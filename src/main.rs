use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use udf_adapter::config::AppConfig;
use udf_adapter::router::create_router;
use udf_adapter::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting UDF adapter service");

    let config = AppConfig::from_env()?;
    let state = AppState::new(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
