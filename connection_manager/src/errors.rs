use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Statement expects {expected} arguments but {actual} were supplied")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("Column '{column}' has unsupported type {type_name}")]
    UnsupportedColumnType { column: String, type_name: String },
}

impl ExecutionError {
    /// True when the pool could not hand out a connection in time
    pub fn is_pool_timeout(&self) -> bool {
        matches!(self, ExecutionError::Database(sqlx::Error::PoolTimedOut))
    }
}
