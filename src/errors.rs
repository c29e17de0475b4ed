//! Error types for the TableHaus crate
//!
//! Registration problems surface as [`SchemaError`], malformed call arguments
//! as [`QueryError`] and database failures as [`ExecutionError`]. A missing
//! row is never an error; lookups return `Option`.

use config::ConfigError;
use connection_manager::ExecutionError;
use entity_schema::{EntityKind, SchemaError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Results ordered with order by cannot be folded into a map")]
    OrderByWithFold,

    #[error("{entity}: expected {expected} primary key values, got {actual}")]
    NotEnoughPrimaryKeys {
        entity: String,
        expected: usize,
        actual: usize,
    },

    #[error("{entity}: primary key '{field}' has no value")]
    MissingPrimaryKey { entity: String, field: String },

    #[error("{0}: no primary key declared to fold results by")]
    NoFoldKey(String),

    #[error("{0}: every column is part of the primary key, nothing to update")]
    NothingToUpdate(String),
}

#[derive(Error, Debug)]
pub enum TableHausError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Entity type not registered: {0}")]
    EntityNotRegistered(String),

    #[error("Entity type already registered: {0}")]
    EntityAlreadyRegistered(String),

    #[error("Entity type {name} is a {actual}, not a {expected}")]
    WrongKind {
        name: String,
        expected: EntityKind,
        actual: EntityKind,
    },
}
