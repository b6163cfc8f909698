//! Company REST API Server
//!
//! ## Usage
//!
//! ```bash
//! CONFIG=config.yaml cargo run --bin companysvc
//!
//! curl -X POST http://localhost:8080/api/v1/company \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Acme", "code": "AC-1", "country": "UA"}'
//!
//! curl "http://localhost:8080/api/v1/companies?country=UA&limit=10"
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use companysvc::api::build_router;
use companysvc::config::AppConfig;
use companysvc::database::{CompanyStore, DatabaseManager, InMemoryCompanyStore};
use companysvc::events::HttpEventPublisher;
use companysvc::geo::IpApiResolver;
use companysvc::services::CompanyService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    tracing::info!("Starting company service");

    let store = open_store(&config).await?;

    let resolver = IpApiResolver::new(&config.loc.url, config.retry_policy(), config.loc_timeout())
        .context("Invalid geolocation service URL")?;

    let mut service = CompanyService::new(
        store,
        Arc::new(resolver),
        &config.loc.allowed_countries_codes,
    );
    if service.allowed_countries().is_empty() {
        tracing::warn!("No allowed countries configured; every create and delete will be refused");
    }

    if config.events_enabled() {
        let publisher = HttpEventPublisher::new(&config.event.url, config.event_timeout())
            .context("Invalid event sink URL")?;
        service = service.with_publisher(Arc::new(publisher), &config.event.event_channel);
        tracing::info!(
            url = %config.event.url,
            channel = %config.event.event_channel,
            "Publishing company events"
        );
    } else {
        tracing::info!("Event publishing disabled");
    }

    let app = build_router(Arc::new(service), &config.server.prefix_api);

    let listener = TcpListener::bind(&config.server.url)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.url))?;
    tracing::info!(
        "Listening on {} (prefix '{}')",
        config.server.url,
        config.server.prefix_api
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level (`info` when unrecognized).
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.log_level_filter().into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CompanyStore>> {
    let Some(db_config) = config.database_config() else {
        tracing::warn!("db.url is empty; using the in-memory company store");
        return Ok(Arc::new(InMemoryCompanyStore::new()));
    };

    let db = DatabaseManager::new(&db_config)
        .await
        .context("Failed to connect to database")?;

    if let Some(dir) = db_config.migrations.as_deref() {
        db.migrate(dir)
            .await
            .with_context(|| format!("Failed to apply migrations from {}", dir.display()))?;
    }

    Ok(Arc::new(db.company_repository()))
}
