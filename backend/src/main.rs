//! DustReports - Backend Server
//!
//! Serves stock, sales velocity and autonomy reports computed from a
//! periodically refreshed snapshot of the source database.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dust_reports::{
    config::Config,
    create_app,
    snapshot::{parse_refresh_times, run_scheduler, PgSnapshotSource, SnapshotStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dust_server=debug,dust_reports=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting DustReports Server");
    tracing::info!("Environment: {}", config.environment);

    // The pool connects on first use so the server starts without the database
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_lazy(&config.database.url)?;

    let store = Arc::new(SnapshotStore::new());
    let source = Arc::new(PgSnapshotSource::new(db_pool.clone()));

    if config.refresh.on_startup {
        match store.refresh(source.as_ref()).await {
            Ok(outcome) => tracing::info!(?outcome, "Startup snapshot load finished"),
            Err(e) => tracing::error!(error = %e, "Startup snapshot load failed"),
        }
    }

    let times = parse_refresh_times(&config.refresh.times);
    tokio::spawn(run_scheduler(store.clone(), source.clone(), times));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Create application state
    let state = AppState {
        db: db_pool,
        store,
        source,
        config: Arc::new(config),
    };

    let app = create_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
