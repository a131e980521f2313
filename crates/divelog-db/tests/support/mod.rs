//! Throwaway PostgreSQL schemas for repository tests
//!
//! Set TEST_DATABASE_URL (default: postgres://postgres@localhost/postgres)
//! and run: cargo test -p divelog-db -- --ignored

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use divelog_db::{DbClient, PoolSettings};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::Row;

pub struct TestDb {
    client: DbClient,
    schema: String,
}

impl TestDb {
    /// Create a fresh schema named after the test and apply the DDL to it
    pub async fn new(test_name: &str) -> Result<Self> {
        let base_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgres://postgres@localhost/postgres".to_string());
        let schema = format!("divelog_test_{}", test_name.replace('-', "_"));

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&base_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
            .execute(&admin)
            .await
            .context("Failed to drop test schema")?;
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin)
            .await
            .context("Failed to create test schema")?;
        admin.close().await;

        let opts = PgConnectOptions::from_str(&base_url)?
            .options([("search_path", schema.as_str())]);
        let client = DbClient::with_options(opts, PoolSettings::default()).await?;
        client.init_schema().await?;

        Ok(Self { client, schema })
    }

    pub fn client(&self) -> &DbClient {
        &self.client
    }

    pub async fn count(&self, table: &str) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}.{table}", self.schema))
            .fetch_one(self.client.pool())
            .await?;
        Ok(row.get("count"))
    }

    /// Insert an instructor directly; no repository exists for them
    pub async fn insert_instructor(&self, full_name: &str) -> Result<i64> {
        let row = sqlx::query("INSERT INTO instructors (full_name) VALUES ($1) RETURNING id")
            .bind(full_name)
            .fetch_one(self.client.pool())
            .await?;
        Ok(row.get("id"))
    }
}
