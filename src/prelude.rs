//! Convenience re-exports for common TableHaus usage
//!
//! ```rust
//! use tablehaus::prelude::*;
//! ```

pub use crate::core::TableHaus;
pub use crate::criteria::{Criteria, Filter, Limit};
pub use crate::errors::{QueryError, TableHausError};
pub use crate::projection::JoinedProjection;
pub use crate::table::BaseTable;
pub use crate::view::View;

pub use config::{AppConfig, DatabaseConfig};
pub use connection_manager::{
    ConnectionManager, ExecutionError, OnShutdown, QueryExecutor, RowStream, Transaction,
};
pub use entity_schema::{EntityKind, FieldDescriptor, JoinSource, SchemaError};
pub use type_mapping::{ColumnType, FromSqlValue, Record, SqlValue};

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use futures::{StreamExt, TryStreamExt};
pub use tokio;
