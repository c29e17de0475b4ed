//! Unified value model shared by the schema compiler, the connection manager
//! and the entity runtime.
//!
//! - [`ColumnType`]: the logical type tag fixed on a field at declaration time
//! - [`SqlValue`]: a runtime value bound to, or decoded from, a statement
//! - [`Record`]: an ordered field-name to value container (one entity instance)

pub mod column;
pub mod record;
pub mod serialize;
pub mod types;

pub use column::ColumnType;
pub use record::Record;
pub use types::{FromSqlValue, SqlValue};
