//! Entity Schema - field descriptors and the schema compiler
//!
//! An entity type is declared as a list of [`FieldDescriptor`]s and compiled
//! once into an [`EntitySchema`] (views, joined projections) or a
//! [`TableSchema`] (base tables) holding every SQL template the runtime needs.

pub mod compiler;
pub mod errors;
pub mod field;
pub mod validation;

pub use compiler::{
    compile_base_table, compile_joined, compile_view, EntityKind, EntitySchema, JoinSource,
    TableSchema,
};
pub use errors::SchemaError;
pub use field::{FieldDefault, FieldDescriptor};
pub use validation::{ValidatedIdentifier, ValidationError};
