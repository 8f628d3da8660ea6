use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use serval::auth::StoreIdentity;
use serval::config::{Config, DatabaseBackend};
use serval::qr::SvgQrRenderer;
use serval::redirect::{create_redirect_router, RedirectResolver};
use serval::scan::{GeoIpService, ScanRecorder};
use serval::service::LinkService;
use serval::storage::{CachedStorage, LinkStore, PostgresStorage, ScanStore, SqliteStorage};
use serval::api::create_api_router;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage; the same backend serves links and scans.
    let (links, scans): (Arc<dyn LinkStore>, Arc<dyn ScanStore>) = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            let storage = Arc::new(SqliteStorage::new(&config.database.url, 5).await?);
            (storage.clone(), storage)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            let storage = Arc::new(PostgresStorage::new(&config.database.url).await?);
            (storage.clone(), storage)
        }
    };

    info!("Initializing database...");
    links.init().await?;
    info!("Database initialized successfully");

    let links: Arc<dyn LinkStore> = if config.cache.enabled {
        info!(
            "Link lookup cache enabled ({} entries max)",
            config.cache.max_entries
        );
        Arc::new(CachedStorage::new(links, config.cache.max_entries))
    } else {
        links
    };

    // Optional GeoIP fallback for scans without edge geo headers.
    let geoip = match config.scan.geoip_db_path.as_deref() {
        Some(path) => {
            info!("GeoIP fallback enabled: {}", path);
            Some(Arc::new(GeoIpService::new(path)?))
        }
        None => None,
    };

    let recorder = Arc::new(ScanRecorder::new(
        Arc::clone(&scans),
        geoip,
        Duration::from_millis(config.scan.write_timeout_ms),
    ));

    let identity = Arc::new(StoreIdentity::new(Arc::clone(&links)));
    let service = LinkService::new(
        Arc::clone(&links),
        Arc::clone(&scans),
        identity,
        Arc::new(SvgQrRenderer::default()),
        config.base_url.clone(),
    );

    let api_router = create_api_router(service);
    let redirect_router =
        create_redirect_router(RedirectResolver::new(Arc::clone(&links), recorder));

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}", api_addr);

    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("Redirect server listening on http://{}", redirect_addr);
    info!("Short links served as {}/{{id}}", config.base_url);

    tokio::try_join!(
        axum::serve(api_listener, api_router),
        axum::serve(redirect_listener, redirect_router),
    )?;

    Ok(())
}
