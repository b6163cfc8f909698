//! Company persistence
//!
//! [`CompanyStore`] is the storage port used by the company service. The
//! PostgreSQL repository and connection management are compiled with the
//! `database` feature; the in-memory store is always available.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Company, FilterOptions};

pub mod filter;
pub mod memory;

#[cfg(feature = "database")]
pub mod company_repository;

pub use filter::{build_filter_clause, FilterBind, FilterClause};
pub use memory::InMemoryCompanyStore;

#[cfg(feature = "database")]
pub use company_repository::PgCompanyRepository;

/// CRUD over companies keyed by `(name, code)`.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Fetch one company. Fails with `NotFound` when no row matches.
    async fn get(&self, name: &str, code: &str) -> Result<Company>;

    /// List companies matching every filter attribute, capped by the limit.
    /// Returns an empty vec when nothing matches.
    async fn get_many(&self, filter: &FilterOptions) -> Result<Vec<Company>>;

    /// Insert a company. Fails with `AlreadyExists` on a duplicate identity.
    async fn create(&self, company: &Company) -> Result<()>;

    /// Replace the row identified by `(old_name, old_code)`, possibly
    /// changing its identity.
    async fn update(&self, old_name: &str, old_code: &str, company: &Company) -> Result<()>;

    /// Remove a company. Fails with `NotFound` when no row matches.
    async fn delete(&self, name: &str, code: &str) -> Result<()>;
}

#[cfg(feature = "database")]
pub use manager::{DatabaseConfig, DatabaseManager};

#[cfg(feature = "database")]
mod manager {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use sqlx::migrate::{MigrateError, Migrator};
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use sqlx::PgPool;
    use tracing::{info, warn};

    use super::PgCompanyRepository;

    /// Database configuration
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        pub host: String,
        pub port: u16,
        pub username: String,
        pub password: String,
        pub database: String,
        /// Pool size; zero keeps the sqlx default.
        pub max_connections: u32,
        pub connection_timeout: Duration,
        /// Directory of SQL migrations applied at startup.
        pub migrations: Option<PathBuf>,
    }

    impl Default for DatabaseConfig {
        fn default() -> Self {
            Self {
                host: "localhost".to_string(),
                port: 5432,
                username: "postgres".to_string(),
                password: String::new(),
                database: "companies".to_string(),
                max_connections: 10,
                connection_timeout: Duration::from_secs(30),
                migrations: None,
            }
        }
    }

    impl DatabaseConfig {
        pub fn connect_options(&self) -> PgConnectOptions {
            PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.username)
                .password(&self.password)
                .database(&self.database)
        }
    }

    /// Database connection manager
    pub struct DatabaseManager {
        pool: PgPool,
    }

    impl DatabaseManager {
        /// Open the pool. Fails if no connection can be established.
        pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
            info!(
                host = %config.host,
                port = config.port,
                database = %config.database,
                "Connecting to database"
            );

            let mut pool_options = PgPoolOptions::new().acquire_timeout(config.connection_timeout);
            if config.max_connections > 0 {
                pool_options = pool_options.max_connections(config.max_connections);
            }

            let pool = pool_options
                .connect_with(config.connect_options())
                .await
                .map_err(|e| {
                    warn!("Failed to connect to database: {}", e);
                    e
                })?;

            info!("Database connection pool created successfully");
            Ok(Self { pool })
        }

        /// Wrap an existing pool.
        pub fn from_pool(pool: PgPool) -> Self {
            Self { pool }
        }

        pub fn pool(&self) -> &PgPool {
            &self.pool
        }

        /// Apply pending migrations from `dir`. Already applied ones are skipped.
        pub async fn migrate(&self, dir: &Path) -> Result<(), MigrateError> {
            info!(dir = %dir.display(), "Applying migrations");
            let migrator = Migrator::new(dir).await?;
            migrator.run(&self.pool).await
        }

        pub fn company_repository(&self) -> PgCompanyRepository {
            PgCompanyRepository::new(self.pool.clone())
        }
    }
}
