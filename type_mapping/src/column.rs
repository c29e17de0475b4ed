//! Logical column types
//!
//! A column type is fixed when a field is declared. It never changes how a
//! value is bound at runtime except for the typed NULL sent for absent values,
//! and it provides the DDL hint used when rendering table definitions.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Boolean,
    Integer,
    SmallInt,
    Float,
    Text,
    DateTime,
}

impl ColumnType {
    /// PostgreSQL type used when rendering a column definition
    pub fn ddl(&self) -> &'static str {
        match self {
            ColumnType::String => "VARCHAR(255)",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "BIGINT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::DateTime => "TIMESTAMP WITH TIME ZONE",
        }
    }

    /// Descriptor family name used in diagnostics
    pub fn field_kind(&self) -> &'static str {
        match self {
            ColumnType::String => "StringField",
            ColumnType::Boolean => "BooleanField",
            ColumnType::Integer => "IntegerField",
            ColumnType::SmallInt => "SmallIntField",
            ColumnType::Float => "FloatField",
            ColumnType::Text => "TextField",
            ColumnType::DateTime => "DateTimeField",
        }
    }

    /// Whether a field of this type may be declared as primary key.
    /// Booleans and free text make poor identities.
    pub fn can_be_primary_key(&self) -> bool {
        !matches!(self, ColumnType::Boolean | ColumnType::Text)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ddl())
    }
}
