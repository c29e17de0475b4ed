//! Explicit transactions
//!
//! A [`Transaction`] pins one connection. Statements run through it see each
//! other's writes. Dropping it without [`commit`](Transaction::commit) rolls
//! the work back.

use sqlx::Postgres;
use tokio::sync::Mutex;
use type_mapping::{Record, SqlValue};

use crate::errors::ExecutionError;
use crate::placeholder::prepare;
use crate::statement;

pub struct Transaction {
    tx: Mutex<sqlx::Transaction<'static, Postgres>>,
}

impl Transaction {
    pub(crate) fn new(tx: sqlx::Transaction<'static, Postgres>) -> Self {
        tracing::debug!("transaction started");
        Self { tx: Mutex::new(tx) }
    }

    pub async fn query(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, ExecutionError> {
        let sql = prepare(sql, args.len())?;
        #[cfg(feature = "debug-logging")]
        tracing::debug!(sql = %sql, args = args.len(), ?limit, "transaction query");

        let mut tx = self.tx.lock().await;
        statement::fetch_records(&mut **tx, &sql, args, limit).await
    }

    pub async fn execute(&self, sql: &str, args: Vec<SqlValue>) -> Result<u64, ExecutionError> {
        let sql = prepare(sql, args.len())?;
        #[cfg(feature = "debug-logging")]
        tracing::debug!(sql = %sql, args = args.len(), "transaction execute");

        let mut tx = self.tx.lock().await;
        statement::execute(&mut **tx, &sql, args).await
    }

    pub async fn commit(self) -> Result<(), ExecutionError> {
        self.tx.into_inner().commit().await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), ExecutionError> {
        self.tx.into_inner().rollback().await?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}
