//! Executor seams
//!
//! The entity runtime only talks to the database through [`QueryExecutor`],
//! so the same entity operation can run on the pool or inside a transaction.

use async_trait::async_trait;
use type_mapping::{Record, SqlValue};

use crate::errors::ExecutionError;
use crate::manager::ConnectionManager;
use crate::transaction::Transaction;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Rows produced by `sql`, at most `limit` of them when given
    async fn fetch_rows(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, ExecutionError>;

    /// Affected row count of a side-effecting statement
    async fn execute_statement(&self, sql: &str, args: Vec<SqlValue>)
        -> Result<u64, ExecutionError>;
}

/// Hook run when the owning application shuts down
#[async_trait]
pub trait OnShutdown: Send + Sync {
    async fn on_shutdown(&self);
}

#[async_trait]
impl QueryExecutor for ConnectionManager {
    async fn fetch_rows(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, ExecutionError> {
        self.query(sql, args, limit).await
    }

    async fn execute_statement(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<u64, ExecutionError> {
        self.execute(sql, args, self.autocommit()).await
    }
}

#[async_trait]
impl QueryExecutor for Transaction {
    async fn fetch_rows(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, ExecutionError> {
        self.query(sql, args, limit).await
    }

    async fn execute_statement(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<u64, ExecutionError> {
        self.execute(sql, args).await
    }
}

#[async_trait]
impl OnShutdown for ConnectionManager {
    async fn on_shutdown(&self) {
        self.close().await;
    }
}
