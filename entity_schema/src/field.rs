//! Field descriptors
//!
//! A [`FieldDescriptor`] describes one declared column. Descriptors are built
//! with consuming builder methods and become read-only once handed to the
//! schema compiler.

use std::fmt;
use std::sync::Arc;
use type_mapping::{ColumnType, SqlValue};

use crate::validation::quote_identifier;

/// Value used for a field that is absent when a row is inserted
#[derive(Clone)]
pub enum FieldDefault {
    Literal(SqlValue),
    Supplier(Arc<dyn Fn() -> SqlValue + Send + Sync>),
}

impl FieldDefault {
    /// Produce the default value; suppliers are invoked on every call
    pub fn resolve(&self) -> SqlValue {
        match self {
            FieldDefault::Literal(value) => value.clone(),
            FieldDefault::Supplier(supplier) => supplier(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            FieldDefault::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    attribute: String,
    prefix: Option<String>,
    name: Option<String>,
    column_type: ColumnType,
    primary_key: bool,
    default: Option<FieldDefault>,
    ddl: Option<String>,
}

impl FieldDescriptor {
    /// Declare a field; the column name defaults to the attribute name
    pub fn new(attribute: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            attribute: attribute.into(),
            prefix: None,
            name: None,
            column_type,
            primary_key: false,
            default: None,
            ddl: None,
        }
    }

    pub fn string(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::String)
    }

    pub fn boolean(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::Boolean)
    }

    pub fn integer(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::Integer)
    }

    pub fn small_int(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::SmallInt)
    }

    pub fn float(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::Float)
    }

    pub fn text(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::Text)
    }

    pub fn datetime(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ColumnType::DateTime)
    }

    /// Map the field to a column with a different name
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Qualify the column with a joined table's alias
    pub fn prefix(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.prefix = if alias.is_empty() { None } else { Some(alias) };
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = Some(FieldDefault::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> SqlValue + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Supplier(Arc::new(supplier)));
        self
    }

    /// Override the DDL type rendered for this column, e.g. `VARCHAR(50)`
    pub fn ddl(mut self, ddl: impl Into<String>) -> Self {
        self.ddl = Some(ddl.into());
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn prefix_alias(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn column_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.attribute)
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    pub fn ddl_hint(&self) -> &str {
        self.ddl.as_deref().unwrap_or(self.column_type.ddl())
    }

    /// `"col"` or `alias."col"`
    pub fn qualified_column(&self) -> String {
        match &self.prefix {
            Some(alias) => format!("{}.{}", alias, quote_identifier(self.column_name())),
            None => quote_identifier(self.column_name()),
        }
    }

    /// Select-list entry; renamed columns are labelled with the attribute name
    /// so hydrated rows are keyed by field name
    pub(crate) fn select_expr(&self) -> String {
        if self.column_name() == self.attribute {
            self.qualified_column()
        } else {
            format!(
                "{} as {}",
                self.qualified_column(),
                quote_identifier(&self.attribute)
            )
        }
    }

    /// A NULL that binds with this column's declared type
    pub fn typed_null(&self) -> SqlValue {
        SqlValue::TypedNull(self.column_type)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {}>",
            self.column_type.field_kind(),
            self.ddl_hint(),
            self.qualified_column()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_column_name_defaults_to_attribute() {
        let field = FieldDescriptor::float("total");
        assert_eq!(field.column_name(), "total");
        assert_eq!(field.qualified_column(), "\"total\"");
        assert_eq!(field.select_expr(), "\"total\"");

        let renamed = FieldDescriptor::float("total").column("order_total");
        assert_eq!(renamed.column_name(), "order_total");
        assert_eq!(renamed.select_expr(), "\"order_total\" as \"total\"");
    }

    #[test]
    fn test_prefixed_column() {
        let field = FieldDescriptor::string("title").prefix("p");
        assert_eq!(field.prefix_alias(), Some("p"));
        assert_eq!(field.qualified_column(), "p.\"title\"");
        assert!(FieldDescriptor::string("title").prefix("").prefix_alias().is_none());
    }

    #[test]
    fn test_display_description() {
        let field = FieldDescriptor::string("email").ddl("VARCHAR(50)");
        assert_eq!(field.to_string(), "<StringField, VARCHAR(50), \"email\">");
        let field = FieldDescriptor::float("total").prefix("o");
        assert_eq!(field.to_string(), "<FloatField, DOUBLE PRECISION, o.\"total\">");
    }

    #[test]
    fn test_supplier_invoked_each_time() {
        let counter = Arc::new(AtomicI64::new(0));
        let source = Arc::clone(&counter);
        let field = FieldDescriptor::integer("seq")
            .default_with(move || SqlValue::BigInt(source.fetch_add(1, Ordering::SeqCst)));
        let default = field.default().unwrap();
        assert_eq!(default.resolve(), SqlValue::BigInt(0));
        assert_eq!(default.resolve(), SqlValue::BigInt(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_literal_default() {
        let field = FieldDescriptor::boolean("admin").default_value(false);
        assert_eq!(field.default().unwrap().resolve(), SqlValue::Boolean(false));
        assert!(format!("{:?}", field.default().unwrap()).starts_with("Literal"));
    }
}
