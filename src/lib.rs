//! # TableHaus
//!
//! A small object-relational layer for PostgreSQL. Entity types are declared
//! as field lists and compiled once into parameterized SQL; a pooled
//! connection manager runs that SQL with transactional and streaming
//! variants.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablehaus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TableHausError> {
//!     let mut haus = TableHaus::new(DatabaseConfig::default());
//!     let orders = haus.register_table(
//!         "orders",
//!         vec![
//!             FieldDescriptor::string("id").primary_key(),
//!             FieldDescriptor::float("total"),
//!         ],
//!     )?;
//!     let manager = haus.manager().clone();
//!
//!     let mut order = Record::new().with("id", "o1").with("total", 9.5);
//!     orders.insert(&mut order, manager.as_ref()).await?;
//!
//!     let found = orders
//!         .find_by_primary_key(&[SqlValue::from("o1")], manager.as_ref())
//!         .await?;
//!     assert_eq!(found, Some(order));
//!
//!     haus.on_shutdown().await;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod criteria;
pub mod errors;
pub mod prelude;
pub mod projection;
mod runtime;
pub mod table;
#[cfg(test)]
mod testing;
pub mod view;

pub use crate::core::TableHaus;
pub use criteria::{Criteria, Filter, Limit};
pub use errors::{QueryError, TableHausError};
pub use projection::JoinedProjection;
pub use table::BaseTable;
pub use view::View;

pub use config::{AppConfig, DatabaseConfig};

// Re-export workspace crates used in the public API
pub use config;
pub use connection_manager;
pub use entity_schema;
pub use type_mapping;

pub use async_trait;
pub use sqlx;
