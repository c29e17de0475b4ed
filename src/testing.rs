//! In-memory executor for runtime unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use connection_manager::{ExecutionError, QueryExecutor};
use type_mapping::{Record, SqlValue};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub sql: String,
    pub args: Vec<SqlValue>,
    pub limit: Option<usize>,
}

/// Records every statement and answers queries from queued result sets
pub(crate) struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    results: Mutex<VecDeque<Vec<Record>>>,
    affected: u64,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
            affected: 1,
        }
    }

    /// Queue the rows returned by the next query
    pub fn with_rows(self, rows: Vec<Record>) -> Self {
        self.results.lock().unwrap().push_back(rows);
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, args: Vec<SqlValue>, limit: Option<usize>) {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            args,
            limit,
        });
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn fetch_rows(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, ExecutionError> {
        self.record(sql, args, limit);
        let mut rows = self.results.lock().unwrap().pop_front().unwrap_or_default();
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn execute_statement(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<u64, ExecutionError> {
        self.record(sql, args, None);
        Ok(self.affected)
    }
}
