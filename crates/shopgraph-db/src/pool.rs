//! Postgres connection management.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use shopgraph_core::EntityKind;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use thiserror::Error;

pub use sqlx::Error as SqlxError;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Postgres connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Failed to read table '{entity}': {source}")]
    Query {
        entity: EntityKind,
        #[source]
        source: sqlx::Error,
    },
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Configuration for connecting to Postgres.
#[derive(Clone, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "postgres".to_string(),
            port: 5432,
            database: "shop".to_string(),
            user: "app".to_string(),
            password: "appsecret".to_string(),
        }
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl PostgresConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Relational source backed by a single Postgres connection.
#[derive(Clone)]
pub struct PgSource {
    pub(crate) pool: PgPool,
    options: PgConnectOptions,
}

impl PgSource {
    /// Create the source without touching the network.
    ///
    /// The pool connects on the first extraction query. Readiness probes
    /// bypass it, see [`PgSource::ping`].
    pub fn connect_lazy(config: &PostgresConfig) -> Self {
        let options = config.connect_options();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy_with(options.clone());
        Self { pool, options }
    }

    /// Open a fresh connection and run `SELECT 1`.
    ///
    /// A pooled acquire would retry internally until its own timeout and
    /// report `PoolTimedOut`; a direct connect fails with the I/O cause.
    pub async fn ping(&self) -> DbResult<()> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        sqlx::query("SELECT 1").execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PostgresConfig::default();
        assert_eq!(config.host, "postgres");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "shop");
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", PostgresConfig::default());
        assert!(rendered.contains("shop"));
        assert!(!rendered.contains("appsecret"));
    }

    #[test]
    fn test_query_error_names_table() {
        let err = DbError::Query {
            entity: EntityKind::OrderItem,
            source: sqlx::Error::RowNotFound,
        };
        assert!(err.to_string().starts_with("Failed to read table 'order_items'"));
    }

    #[tokio::test]
    async fn test_ping_fails_fast_with_connect_cause() {
        let config = PostgresConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..Default::default()
        };
        let source = PgSource::connect_lazy(&config);

        let started = std::time::Instant::now();
        let err = source.ping().await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(err, DbError::Connection(ref e) if !matches!(e, sqlx::Error::PoolTimedOut)));
        assert!(!err.to_string().contains("pool timed out"));
    }
}
