use crate::validation::ValidationError;
use thiserror::Error;
use type_mapping::ColumnType;

/// Structural problems found while registering an entity type.
/// A type that fails with any of these is unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{entity}: invalid identifier: {source}")]
    InvalidIdentifier {
        entity: String,
        #[source]
        source: ValidationError,
    },

    #[error("{entity}: field '{field}' declared more than once")]
    DuplicateField { entity: String, field: String },

    #[error("{entity}: column {column} mapped by more than one field")]
    DuplicateColumn { entity: String, column: String },

    #[error("{entity}: a table needs at least one primary key")]
    MissingPrimaryKey { entity: String },

    #[error("{entity}: primary key '{field}' is not allowed in a view")]
    PrimaryKeyOnView { entity: String, field: String },

    #[error("{entity}: field '{field}' of type {column_type:?} cannot be a primary key")]
    InvalidPrimaryKeyType {
        entity: String,
        field: String,
        column_type: ColumnType,
    },

    #[error("{entity}: field '{field}' has a table prefix but the entity reads a single table")]
    UnexpectedPrefix { entity: String, field: String },

    #[error("{entity}: field '{field}' must name the alias of the joined table it comes from")]
    MissingAlias { entity: String, field: String },

    #[error("{entity}: field '{field}' uses alias '{alias}' which is not among the joined tables")]
    UnknownAlias {
        entity: String,
        field: String,
        alias: String,
    },

    #[error("{entity}: alias '{alias}' used for more than one joined table")]
    DuplicateAlias { entity: String, alias: String },

    #[error("{entity}: field '{field}' declares a default, which joined projections do not allow")]
    DefaultOnJoinedField { entity: String, field: String },

    #[error("{entity}: joined projections allow one primary key, found '{first}' and '{second}'")]
    DuplicatePrimaryKey {
        entity: String,
        first: String,
        second: String,
    },

    #[error("{entity}: a joined projection needs at least one table")]
    NoJoinSources { entity: String },
}

impl SchemaError {
    pub(crate) fn invalid_identifier(entity: &str, source: ValidationError) -> Self {
        Self::InvalidIdentifier {
            entity: entity.to_string(),
            source,
        }
    }
}
