//! Connection Manager - pooled query execution for PostgreSQL
//!
//! Owns the connection pool and exposes three ways to run SQL:
//! [`ConnectionManager::query`] for rows, [`ConnectionManager::execute`] for
//! side effects (optionally wrapped in a transaction) and
//! [`ConnectionManager::streaming_query`] for a cursor that does not buffer.
//! [`ConnectionManager::begin`] hands out an explicit [`Transaction`].

mod binding;
pub mod errors;
pub mod executor;
pub mod manager;
pub mod placeholder;
mod statement;
pub mod stream;
pub mod transaction;

pub use errors::ExecutionError;
pub use executor::{OnShutdown, QueryExecutor};
pub use manager::ConnectionManager;
pub use stream::RowStream;
pub use transaction::Transaction;
