use face_to_face_backend::{
    config::{init_config, LogFormat},
    database::catalog::Catalog,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = init_config()?;
    init_tracing(config.log_format);

    let catalog = Catalog::seeded();
    info!(
        activities = catalog.activities.len(),
        recommendations = catalog.recommendations.len(),
        "catalog loaded"
    );

    let app_state = AppState::new(config, catalog);
    let app = routes::app_router(app_state, config);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
