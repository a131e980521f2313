//! Database client and connection management

use crate::schema::DDL;
use crate::translate::translate;
use divelog_core::{DiveLogResult, StoreProbe};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Pool sizing and acquisition limits
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolSettings {
    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Database client wrapping sqlx connection pool
///
/// Constructed once at startup and shared by cloning; every repository
/// operation checks a connection out of the pool for its own unit of work.
#[derive(Clone)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    /// Create a new database client with custom options
    pub async fn with_options(opts: PgConnectOptions, settings: PoolSettings) -> DiveLogResult<Self> {
        let pool = settings
            .pool_options()
            .connect_with(opts)
            .await
            .map_err(translate)?;

        Ok(Self { pool })
    }

    /// Create a client without opening any connection yet
    pub fn connect_lazy(opts: PgConnectOptions, settings: PoolSettings) -> Self {
        let pool = settings.pool_options().connect_lazy_with(opts);
        Self { pool }
    }

    /// Get reference to underlying pool for direct queries
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the schema. Safe to run on every start.
    pub async fn init_schema(&self) -> DiveLogResult<()> {
        let mut tx = self.pool.begin().await.map_err(translate)?;
        for statement in DDL {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(translate)?;
        }
        tx.commit().await.map_err(translate)?;

        info!(statements = DDL.len(), "schema ready");
        Ok(())
    }

    /// Close the connection pool gracefully
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl StoreProbe for DbClient {
    /// Test the database connection
    async fn ping(&self) -> DiveLogResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(translate)?;
        Ok(())
    }
}

/// Build PostgreSQL connection options from components
pub struct DbConnectionBuilder {
    host: String,
    port: u16,
    database: String,
    username: String,
    password: Option<String>,
    statement_timeout: Option<Duration>,
}

impl DbConnectionBuilder {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: database.into(),
            username: "postgres".to_string(),
            password: None,
            statement_timeout: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Server-side cap on any single statement
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> PgConnectOptions {
        let mut opts = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .application_name("divelog");

        if let Some(password) = self.password {
            opts = opts.password(&password);
        }

        if let Some(timeout) = self.statement_timeout {
            let millis = timeout.as_millis().to_string();
            opts = opts.options([("statement_timeout", millis.as_str())]);
        }

        opts
    }
}
