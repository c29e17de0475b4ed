//! Pool ownership and statement execution
//!
//! The pool is created on first use and torn down exactly once by
//! [`ConnectionManager::close`]. Any operation after a close builds a new pool.

use std::time::Duration;

use config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::sync::RwLock;
use type_mapping::{Record, SqlValue};

use crate::errors::ExecutionError;
use crate::placeholder::prepare;
use crate::statement;
use crate::stream::RowStream;
use crate::transaction::Transaction;

pub struct ConnectionManager {
    config: DatabaseConfig,
    pool: RwLock<Option<PgPool>>,
}

impl ConnectionManager {
    /// Create a manager; no connection is opened until first use
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Default used when a statement is executed without an explicit choice
    pub fn autocommit(&self) -> bool {
        self.config.autocommit
    }

    pub async fn is_connected(&self) -> bool {
        self.pool
            .read()
            .await
            .as_ref()
            .is_some_and(|pool| !pool.is_closed())
    }

    /// Open the pool. Does nothing when it is already open.
    pub async fn connect(&self) -> Result<(), ExecutionError> {
        self.open_pool().await.map(|_| ())
    }

    /// Drain and drop the pool. Does nothing when it is not open.
    pub async fn close(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!(
                host = %self.config.host,
                database = %self.config.database,
                "connection pool closed"
            );
        }
    }

    async fn pool(&self) -> Result<PgPool, ExecutionError> {
        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(pool.clone());
        }
        self.open_pool().await
    }

    async fn open_pool(&self) -> Result<PgPool, ExecutionError> {
        let mut slot = self.pool.write().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let pool = self.pool_options().connect_with(self.connect_options()).await?;
        tracing::info!(
            host = %self.config.host,
            database = %self.config.database,
            min = self.config.min_connections,
            max = self.config.max_connections,
            "connection pool opened"
        );
        *slot = Some(pool.clone());
        Ok(pool)
    }

    fn pool_options(&self) -> PgPoolOptions {
        let config = &self.config;
        let mut options = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds));

        if config.idle_timeout_seconds > 0 {
            options = options.idle_timeout(Duration::from_secs(config.idle_timeout_seconds));
        }
        if config.max_lifetime_seconds > 0 {
            options = options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }
        options
    }

    fn connect_options(&self) -> PgConnectOptions {
        let config = &self.config;
        if !config.charset.eq_ignore_ascii_case("utf8") {
            tracing::warn!(charset = %config.charset, "text columns are decoded as UTF-8");
        }
        PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .options([("client_encoding", config.charset.as_str())])
    }

    /// Run a row-returning statement outside any transaction. `limit` caps
    /// the rows read; `None` reads them all.
    pub async fn query(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, ExecutionError> {
        let sql = prepare(sql, args.len())?;
        #[cfg(feature = "debug-logging")]
        tracing::debug!(sql = %sql, args = args.len(), ?limit, "query");

        let pool = self.pool().await?;
        statement::fetch_records(&pool, &sql, args, limit).await
    }

    /// Run a side-effecting statement and return the affected row count.
    ///
    /// With `autocommit` off the statement runs inside its own transaction,
    /// committed on success and rolled back on failure.
    pub async fn execute(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        autocommit: bool,
    ) -> Result<u64, ExecutionError> {
        let sql = prepare(sql, args.len())?;
        #[cfg(feature = "debug-logging")]
        tracing::debug!(sql = %sql, args = args.len(), autocommit, "execute");

        let pool = self.pool().await?;
        if autocommit {
            return statement::execute(&pool, &sql, args).await;
        }

        let mut tx = pool.begin().await?;
        match statement::execute(&mut *tx, &sql, args).await {
            Ok(affected) => {
                tx.commit().await?;
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::error!(error = %rollback_error, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Open a streaming cursor that holds one connection until the stream
    /// is exhausted or dropped
    pub async fn streaming_query(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<RowStream, ExecutionError> {
        let sql = prepare(sql, args.len())?;
        #[cfg(feature = "debug-logging")]
        tracing::debug!(sql = %sql, args = args.len(), "streaming query");

        let conn = self.pool().await?.acquire().await?;
        Ok(RowStream::open(conn, sql, args))
    }

    /// Start an explicit transaction on a dedicated connection
    pub async fn begin(&self) -> Result<Transaction, ExecutionError> {
        let tx = self.pool().await?.begin().await?;
        Ok(Transaction::new(tx))
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), ExecutionError> {
        let pool = self.pool().await?;
        sqlx::query("select 1").execute(&pool).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("autocommit", &self.config.autocommit)
            .finish_non_exhaustive()
    }
}
