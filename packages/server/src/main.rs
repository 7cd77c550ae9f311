use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use server::config::AppConfig;
use server::replication::{NodeOptions, RegistryStore};
use server::state::AppState;
use tower_http::cors::CorsLayer;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let config = AppConfig::load()?;
    let db = server::database::init_db(&config.database.url).await?;

    // The Kafka journal is compiled in behind the `kafka` feature; the
    // default build runs the in-process journal (single-node deployments).
    #[cfg(feature = "kafka")]
    let journal: Arc<dyn journal::Journal> =
        journal::kafka::KafkaJournal::connect(config.journal.clone())?;
    #[cfg(not(feature = "kafka"))]
    let journal: Arc<dyn journal::Journal> = journal::MemoryJournal::new(config.journal.partitions);

    let options = NodeOptions {
        response_timeout: Duration::from_secs(config.registry.response_timeout_secs),
        poll_timeout: Duration::from_millis(config.journal.poll_timeout_ms),
        channel_capacity: config.registry.channel_capacity,
        strict_references: config.registry.references_strict,
    };
    let store = RegistryStore::start(db, journal, options);

    let state = AppState {
        store: store.clone(),
        config: config.clone(),
    };

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-registry-tenant-id"),
        ])
        .max_age(Duration::from_secs(config.server.cors.max_age));
    for origin in &config.server.cors.allow_origins {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = server::build_router(state).layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Registry node listening at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store))
        .await?;

    Ok(())
}

async fn shutdown_signal(store: Arc<RegistryStore>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
    store.shutdown();
}
