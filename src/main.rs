use std::net::SocketAddr;
use std::sync::Arc;

use dealflow::{config::Config, create_app, db, gateway::MlGateway, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let db = db::connect(&config.database_url).await?;
    tracing::info!("Connected to database, migrations applied");

    let gateway = MlGateway::new(&config.ml_api, config.ml_timeout, config.ml_max_retry)?;
    let bind_addr = config.bind_addr.clone();
    let app = create_app(AppState { db, gateway, config: Arc::new(config) });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
