//! Schema compilation
//!
//! Each entity type is compiled exactly once, when it is registered. The
//! result holds the field mappings and the parameterized SQL templates the
//! runtime binds values to. Templates use the portable `?` placeholder.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;

use crate::errors::SchemaError;
use crate::field::FieldDescriptor;
use crate::validation::{quote_identifier, ValidatedIdentifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    BaseTable,
    View,
    JoinedProjection,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::BaseTable => "table",
            EntityKind::View => "view",
            EntityKind::JoinedProjection => "joined projection",
        };
        f.write_str(name)
    }
}

/// One table taking part in a joined projection, e.g. `"users" u`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSource {
    table: String,
    alias: String,
}

impl JoinSource {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// Compiled, read-only description of an entity type
#[derive(Debug, Clone)]
pub struct EntitySchema {
    name: String,
    kind: EntityKind,
    table_expr: String,
    fields: Vec<String>,
    primary_keys: Vec<String>,
    declared: Vec<String>,
    mappings: HashMap<String, FieldDescriptor>,
    select_sql: String,
    count_sql: String,
}

impl EntitySchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Quoted table name, or the comma-joined source list of a projection
    pub fn table_expr(&self) -> &str {
        &self.table_expr
    }

    /// Non-key field names for tables, every field name otherwise
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    /// The single key used for folding projections into maps
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_keys.first().map(String::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.mappings.get(name)
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.declared.iter().filter_map(|name| self.mappings.get(name))
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    pub fn count_sql(&self) -> &str {
        &self.count_sql
    }
}

/// Compiled base table: the shared schema plus the mutating templates
#[derive(Debug, Clone)]
pub struct TableSchema {
    entity: EntitySchema,
    table: String,
    insert_sql: String,
    update_sql: Option<String>,
    delete_sql: String,
    primary_key_where: String,
    select_by_primary_key_sql: String,
}

impl TableSchema {
    pub fn entity(&self) -> &EntitySchema {
        &self.entity
    }

    /// Non-key values first, key values last
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// `None` when every column is part of the primary key
    pub fn update_sql(&self) -> Option<&str> {
        self.update_sql.as_deref()
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    pub fn primary_key_where(&self) -> &str {
        &self.primary_key_where
    }

    pub fn select_by_primary_key_sql(&self) -> &str {
        &self.select_by_primary_key_sql
    }

    /// Field order used for insert arguments
    pub fn insert_order(&self) -> impl Iterator<Item = &str> {
        self.entity
            .fields
            .iter()
            .chain(self.entity.primary_keys.iter())
            .map(String::as_str)
    }

    /// Render a `create table if not exists` statement from the DDL hints
    pub fn create_table_sql(&self) -> String {
        let mut columns: Vec<String> = self
            .entity
            .descriptors()
            .map(|field| {
                let mut column = format!(
                    "{} {}",
                    quote_identifier(field.column_name()),
                    field.ddl_hint()
                );
                if field.is_primary_key() {
                    column.push_str(" not null");
                }
                column
            })
            .collect();

        let keys = self
            .entity
            .primary_keys
            .iter()
            .filter_map(|name| self.entity.mappings.get(name))
            .map(|field| quote_identifier(field.column_name()))
            .collect::<Vec<_>>()
            .join(", ");
        columns.push(format!("primary key ({})", keys));

        format!(
            "create table if not exists {} ({})",
            self.table,
            columns.join(", ")
        )
    }
}

impl Deref for TableSchema {
    type Target = EntitySchema;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

fn check_identifier(entity: &str, name: &str) -> Result<(), SchemaError> {
    ValidatedIdentifier::new(name)
        .map(|_| ())
        .map_err(|e| SchemaError::invalid_identifier(entity, e))
}

/// Validates names and uniqueness shared by every kind, returning the
/// declaration order and the name to descriptor map.
fn index_fields<F>(
    entity: &str,
    fields: Vec<FieldDescriptor>,
    check: F,
) -> Result<(Vec<String>, HashMap<String, FieldDescriptor>), SchemaError>
where
    F: Fn(&FieldDescriptor) -> Result<(), SchemaError>,
{
    let mut declared = Vec::with_capacity(fields.len());
    let mut mappings = HashMap::with_capacity(fields.len());
    let mut columns = HashSet::with_capacity(fields.len());

    for field in fields {
        check(&field)?;
        check_identifier(entity, field.attribute())?;
        check_identifier(entity, field.column_name())?;
        if let Some(alias) = field.prefix_alias() {
            check_identifier(entity, alias)?;
        }

        if mappings.contains_key(field.attribute()) {
            return Err(SchemaError::DuplicateField {
                entity: entity.to_string(),
                field: field.attribute().to_string(),
            });
        }
        if !columns.insert(field.qualified_column()) {
            return Err(SchemaError::DuplicateColumn {
                entity: entity.to_string(),
                column: field.qualified_column(),
            });
        }
        if field.is_primary_key() && !field.column_type().can_be_primary_key() {
            return Err(SchemaError::InvalidPrimaryKeyType {
                entity: entity.to_string(),
                field: field.attribute().to_string(),
                column_type: field.column_type(),
            });
        }

        #[cfg(feature = "debug-logging")]
        tracing::trace!(entity = %entity, field = %field, "indexed field");

        declared.push(field.attribute().to_string());
        mappings.insert(field.attribute().to_string(), field);
    }

    Ok((declared, mappings))
}

fn reject_prefix(entity: &str, field: &FieldDescriptor) -> Result<(), SchemaError> {
    if field.prefix_alias().is_some() {
        return Err(SchemaError::UnexpectedPrefix {
            entity: entity.to_string(),
            field: field.attribute().to_string(),
        });
    }
    Ok(())
}

fn select_list(names: &[String], mappings: &HashMap<String, FieldDescriptor>) -> String {
    names
        .iter()
        .filter_map(|name| mappings.get(name))
        .map(FieldDescriptor::select_expr)
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_from(list: &str, table_expr: &str) -> String {
    if list.is_empty() {
        format!("select * from {}", table_expr)
    } else {
        format!("select {} from {}", list, table_expr)
    }
}

/// Compile a base table. Needs at least one primary key.
pub fn compile_base_table(
    table: &str,
    fields: Vec<FieldDescriptor>,
) -> Result<TableSchema, SchemaError> {
    check_identifier(table, table)?;
    let (declared, mappings) = index_fields(table, fields, |field| reject_prefix(table, field))?;

    let (primary_keys, non_keys): (Vec<String>, Vec<String>) = declared
        .iter()
        .cloned()
        .partition(|name| mappings.get(name).is_some_and(|f| f.is_primary_key()));

    if primary_keys.is_empty() {
        return Err(SchemaError::MissingPrimaryKey {
            entity: table.to_string(),
        });
    }

    let quoted_table = quote_identifier(table);
    let column_of = |name: &String| {
        mappings
            .get(name)
            .map(|f| quote_identifier(f.column_name()))
            .unwrap_or_default()
    };

    let keyed_first: Vec<String> = primary_keys.iter().chain(non_keys.iter()).cloned().collect();
    let select_sql = select_from(&select_list(&keyed_first, &mappings), &quoted_table);
    let count_sql = format!("select count(*) from {}", quoted_table);

    let primary_key_where = primary_keys
        .iter()
        .map(|name| format!("{} = ?", column_of(name)))
        .collect::<Vec<_>>()
        .join(" and ");

    let insert_columns: Vec<String> = non_keys
        .iter()
        .chain(primary_keys.iter())
        .map(column_of)
        .collect();
    let insert_sql = format!(
        "insert into {} ({}) values ({})",
        quoted_table,
        insert_columns.join(", "),
        vec!["?"; insert_columns.len()].join(", ")
    );

    let update_sql = if non_keys.is_empty() {
        None
    } else {
        let assignments = non_keys
            .iter()
            .map(|name| format!("{} = ?", column_of(name)))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "update {} set {} where {}",
            quoted_table, assignments, primary_key_where
        ))
    };

    let delete_sql = format!("delete from {} where {}", quoted_table, primary_key_where);
    let select_by_primary_key_sql = format!("{} where {}", select_sql, primary_key_where);

    tracing::debug!(
        entity = %table,
        keys = primary_keys.len(),
        fields = non_keys.len(),
        "compiled table schema"
    );

    Ok(TableSchema {
        entity: EntitySchema {
            name: table.to_string(),
            kind: EntityKind::BaseTable,
            table_expr: quoted_table.clone(),
            fields: non_keys,
            primary_keys,
            declared,
            mappings,
            select_sql,
            count_sql,
        },
        table: quoted_table,
        insert_sql,
        update_sql,
        delete_sql,
        primary_key_where,
        select_by_primary_key_sql,
    })
}

/// Compile a read-only view. Primary keys are rejected; defaults are kept
/// on the descriptors but never applied.
pub fn compile_view(view: &str, fields: Vec<FieldDescriptor>) -> Result<EntitySchema, SchemaError> {
    check_identifier(view, view)?;
    let (declared, mappings) = index_fields(view, fields, |field| {
        reject_prefix(view, field)?;
        if field.is_primary_key() {
            return Err(SchemaError::PrimaryKeyOnView {
                entity: view.to_string(),
                field: field.attribute().to_string(),
            });
        }
        Ok(())
    })?;

    let quoted_view = quote_identifier(view);
    let select_sql = select_from(&select_list(&declared, &mappings), &quoted_view);
    let count_sql = format!("select count(*) from {}", quoted_view);

    tracing::debug!(entity = %view, fields = declared.len(), "compiled view schema");

    Ok(EntitySchema {
        name: view.to_string(),
        kind: EntityKind::View,
        table_expr: quoted_view,
        fields: declared.clone(),
        primary_keys: Vec::new(),
        declared,
        mappings,
        select_sql,
        count_sql,
    })
}

/// Compile a projection over several aliased tables. Every field names the
/// alias it reads from; at most one field may be the fold key.
pub fn compile_joined(
    name: &str,
    sources: &[JoinSource],
    fields: Vec<FieldDescriptor>,
) -> Result<EntitySchema, SchemaError> {
    check_identifier(name, name)?;
    if sources.is_empty() {
        return Err(SchemaError::NoJoinSources {
            entity: name.to_string(),
        });
    }

    let mut aliases = HashSet::with_capacity(sources.len());
    for source in sources {
        check_identifier(name, source.table())?;
        check_identifier(name, source.alias())?;
        if !aliases.insert(source.alias()) {
            return Err(SchemaError::DuplicateAlias {
                entity: name.to_string(),
                alias: source.alias().to_string(),
            });
        }
    }

    let (declared, mappings) = index_fields(name, fields, |field| {
        let alias = field.prefix_alias().ok_or_else(|| SchemaError::MissingAlias {
            entity: name.to_string(),
            field: field.attribute().to_string(),
        })?;
        if !aliases.contains(alias) {
            return Err(SchemaError::UnknownAlias {
                entity: name.to_string(),
                field: field.attribute().to_string(),
                alias: alias.to_string(),
            });
        }
        if field.default().is_some() {
            return Err(SchemaError::DefaultOnJoinedField {
                entity: name.to_string(),
                field: field.attribute().to_string(),
            });
        }
        Ok(())
    })?;

    let primary_keys: Vec<String> = declared
        .iter()
        .filter(|field| mappings.get(*field).is_some_and(|f| f.is_primary_key()))
        .cloned()
        .collect();
    if let [first, second, ..] = primary_keys.as_slice() {
        return Err(SchemaError::DuplicatePrimaryKey {
            entity: name.to_string(),
            first: first.clone(),
            second: second.clone(),
        });
    }

    let table_expr = sources
        .iter()
        .map(|source| format!("{} {}", quote_identifier(source.table()), source.alias()))
        .collect::<Vec<_>>()
        .join(", ");
    let select_sql = select_from(&select_list(&declared, &mappings), &table_expr);
    let count_sql = format!("select count(*) from {}", table_expr);

    tracing::debug!(
        entity = %name,
        sources = sources.len(),
        fields = declared.len(),
        "compiled joined projection"
    );

    Ok(EntitySchema {
        name: name.to_string(),
        kind: EntityKind::JoinedProjection,
        table_expr,
        fields: declared.clone(),
        primary_keys,
        declared,
        mappings,
        select_sql,
        count_sql,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use type_mapping::SqlValue;

    fn order_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::string("id").primary_key(),
            FieldDescriptor::float("total"),
        ]
    }

    #[test]
    fn test_base_table_templates() {
        let schema = compile_base_table("orders", order_fields()).unwrap();

        assert_eq!(schema.kind(), EntityKind::BaseTable);
        assert_eq!(schema.select_sql(), "select \"id\", \"total\" from \"orders\"");
        assert_eq!(schema.insert_sql(), "insert into \"orders\" (\"total\", \"id\") values (?, ?)");
        assert_eq!(
            schema.update_sql(),
            Some("update \"orders\" set \"total\" = ? where \"id\" = ?")
        );
        assert_eq!(schema.delete_sql(), "delete from \"orders\" where \"id\" = ?");
        assert_eq!(schema.count_sql(), "select count(*) from \"orders\"");
        assert_eq!(
            schema.select_by_primary_key_sql(),
            "select \"id\", \"total\" from \"orders\" where \"id\" = ?"
        );
        assert_eq!(schema.fields(), &["total".to_string()]);
        assert_eq!(schema.primary_keys(), &["id".to_string()]);
        assert_eq!(schema.insert_order().collect::<Vec<_>>(), vec!["total", "id"]);
    }

    #[test]
    fn test_insert_placeholders_cover_every_field() {
        let schema = compile_base_table(
            "line_items",
            vec![
                FieldDescriptor::string("order_id").primary_key(),
                FieldDescriptor::small_int("line").primary_key(),
                FieldDescriptor::integer("quantity"),
                FieldDescriptor::float("price"),
                FieldDescriptor::datetime("added_at"),
            ],
        )
        .unwrap();

        let placeholders = schema.insert_sql().matches('?').count();
        assert_eq!(placeholders, schema.fields().len() + schema.primary_keys().len());
        assert_eq!(schema.primary_key_where(), "\"order_id\" = ? and \"line\" = ?");
        assert_eq!(
            schema.insert_sql(),
            "insert into \"line_items\" (\"quantity\", \"price\", \"added_at\", \"order_id\", \"line\") values (?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_renamed_column_is_labelled() {
        let schema = compile_base_table(
            "orders",
            vec![
                FieldDescriptor::string("id").primary_key(),
                FieldDescriptor::float("total").column("order_total"),
            ],
        )
        .unwrap();
        assert_eq!(
            schema.select_sql(),
            "select \"id\", \"order_total\" as \"total\" from \"orders\""
        );
        assert_eq!(
            schema.update_sql(),
            Some("update \"orders\" set \"order_total\" = ? where \"id\" = ?")
        );
    }

    #[test]
    fn test_key_only_table_has_no_update() {
        let schema = compile_base_table(
            "tags",
            vec![FieldDescriptor::string("name").primary_key()],
        )
        .unwrap();
        assert!(schema.update_sql().is_none());
        assert_eq!(schema.insert_sql(), "insert into \"tags\" (\"name\") values (?)");
    }

    #[test]
    fn test_table_without_primary_key_rejected() {
        let err = compile_base_table("logs", vec![FieldDescriptor::text("line")]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingPrimaryKey {
                entity: "logs".to_string()
            }
        );
    }

    #[test]
    fn test_table_field_errors() {
        let err = compile_base_table(
            "orders",
            vec![
                FieldDescriptor::string("id").primary_key(),
                FieldDescriptor::float("total").prefix("o"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedPrefix { .. }));

        let err = compile_base_table(
            "orders",
            vec![
                FieldDescriptor::string("id").primary_key(),
                FieldDescriptor::float("id"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));

        let err = compile_base_table(
            "orders",
            vec![
                FieldDescriptor::string("id").primary_key(),
                FieldDescriptor::float("total"),
                FieldDescriptor::float("amount").column("total"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));

        let err = compile_base_table("orders", vec![FieldDescriptor::boolean("flag").primary_key()])
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPrimaryKeyType { .. }));
    }

    #[test]
    fn test_invalid_identifiers_rejected() {
        let err = compile_base_table("orders; drop table x", order_fields()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidIdentifier {
                source: ValidationError::InvalidCharacters(_),
                ..
            }
        ));

        let err = compile_base_table(
            "orders",
            vec![FieldDescriptor::string("id").primary_key().column("1id")],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_create_table_sql() {
        let schema = compile_base_table(
            "users",
            vec![
                FieldDescriptor::integer("id").primary_key(),
                FieldDescriptor::string("email").ddl("VARCHAR(50)"),
                FieldDescriptor::boolean("admin").default_value(false),
            ],
        )
        .unwrap();
        assert_eq!(
            schema.create_table_sql(),
            "create table if not exists \"users\" (\"id\" BIGINT not null, \"email\" VARCHAR(50), \"admin\" BOOLEAN, primary key (\"id\"))"
        );
    }

    #[test]
    fn test_view_templates() {
        let schema = compile_view(
            "order_totals",
            vec![
                FieldDescriptor::string("customer"),
                FieldDescriptor::float("sum_total").default_value(0.0),
            ],
        )
        .unwrap();
        assert_eq!(schema.kind(), EntityKind::View);
        assert_eq!(
            schema.select_sql(),
            "select \"customer\", \"sum_total\" from \"order_totals\""
        );
        assert_eq!(schema.count_sql(), "select count(*) from \"order_totals\"");
        assert!(schema.primary_keys().is_empty());
        assert_eq!(schema.fields().len(), 2);
    }

    #[test]
    fn test_view_without_fields_selects_star() {
        let schema = compile_view("recent_orders", Vec::new()).unwrap();
        assert_eq!(schema.select_sql(), "select * from \"recent_orders\"");
    }

    #[test]
    fn test_view_with_primary_key_rejected() {
        let err = compile_view("v", vec![FieldDescriptor::string("id").primary_key()]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::PrimaryKeyOnView {
                entity: "v".to_string(),
                field: "id".to_string()
            }
        );
    }

    fn sources() -> Vec<JoinSource> {
        vec![JoinSource::new("users", "u"), JoinSource::new("posts", "p")]
    }

    #[test]
    fn test_joined_templates() {
        let schema = compile_joined(
            "user_posts",
            &sources(),
            vec![
                FieldDescriptor::integer("user_id").prefix("u").column("id").primary_key(),
                FieldDescriptor::string("title").prefix("p"),
            ],
        )
        .unwrap();
        assert_eq!(schema.kind(), EntityKind::JoinedProjection);
        assert_eq!(schema.table_expr(), "\"users\" u, \"posts\" p");
        assert_eq!(
            schema.select_sql(),
            "select u.\"id\" as \"user_id\", p.\"title\" from \"users\" u, \"posts\" p"
        );
        assert_eq!(schema.count_sql(), "select count(*) from \"users\" u, \"posts\" p");
        assert_eq!(schema.primary_key(), Some("user_id"));
        assert_eq!(schema.fields(), &["user_id".to_string(), "title".to_string()]);
    }

    #[test]
    fn test_joined_requires_known_alias() {
        let err = compile_joined(
            "user_posts",
            &sources(),
            vec![FieldDescriptor::string("title")],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingAlias { .. }));

        let err = compile_joined(
            "user_posts",
            &sources(),
            vec![FieldDescriptor::string("title").prefix("x")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownAlias {
                entity: "user_posts".to_string(),
                field: "title".to_string(),
                alias: "x".to_string()
            }
        );
    }

    #[test]
    fn test_joined_rejects_two_keys_and_defaults() {
        let err = compile_joined(
            "user_posts",
            &sources(),
            vec![
                FieldDescriptor::integer("user_id").prefix("u").column("id").primary_key(),
                FieldDescriptor::integer("post_id").prefix("p").column("id").primary_key(),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicatePrimaryKey {
                entity: "user_posts".to_string(),
                first: "user_id".to_string(),
                second: "post_id".to_string()
            }
        );

        let err = compile_joined(
            "user_posts",
            &sources(),
            vec![FieldDescriptor::string("title").prefix("p").default_value(SqlValue::Null)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DefaultOnJoinedField { .. }));
    }

    #[test]
    fn test_joined_source_errors() {
        let err = compile_joined("empty", &[], Vec::new()).unwrap_err();
        assert!(matches!(err, SchemaError::NoJoinSources { .. }));

        let err = compile_joined(
            "dup",
            &[JoinSource::new("users", "u"), JoinSource::new("posts", "u")],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAlias { .. }));
    }
}
