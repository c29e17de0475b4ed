//! Base tables
//!
//! A [`BaseTable`] is the registered handle for a table with a primary key.
//! Records are plain [`Record`]s; every operation takes the executor it runs
//! on, so the same handle works on the pool and inside a transaction.

use std::sync::Arc;

use connection_manager::{ConnectionManager, QueryExecutor, RowStream};
use entity_schema::{compile_base_table, FieldDescriptor, SchemaError, TableSchema};
use type_mapping::{Record, SqlValue};

use crate::criteria::{Criteria, Filter};
use crate::errors::{QueryError, TableHausError};
use crate::runtime::{self, bindable, check_affected};
use crate::debug_log;

#[derive(Debug, Clone)]
pub struct BaseTable {
    schema: Arc<TableSchema>,
}

impl BaseTable {
    /// Compile the table's statements. Fails when no field is a primary key.
    pub fn declare(table: &str, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: Arc::new(compile_base_table(table, fields)?),
        })
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Insert `record`. Absent fields take their declared default, which is
    /// written back onto the record.
    pub async fn insert<E>(&self, record: &mut Record, exec: &E) -> Result<u64, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        let args: Vec<SqlValue> = self
            .schema
            .insert_order()
            .filter_map(|name| self.schema.field(name))
            .map(|field| value_or_default(field, record))
            .collect();
        debug_log!(entity = %self.name(), args = args.len(), "insert");

        let affected = exec.execute_statement(self.schema.insert_sql(), args).await?;
        check_affected(self.name(), "insert", affected);
        Ok(affected)
    }

    /// Write every non-key field of `record` to the row with its key.
    /// Absent fields are written as NULL.
    pub async fn save_change<E>(&self, record: &Record, exec: &E) -> Result<u64, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        let update_sql = self
            .schema
            .update_sql()
            .ok_or_else(|| QueryError::NothingToUpdate(self.name().to_string()))?;
        let keys = self.key_values(record)?;

        let mut args: Vec<SqlValue> = self
            .schema
            .fields()
            .iter()
            .filter_map(|name| self.schema.field(name))
            .map(|field| bindable(field, record.get(field.attribute())))
            .collect();
        args.extend(keys);
        debug_log!(entity = %self.name(), args = args.len(), "save change");

        let affected = exec.execute_statement(update_sql, args).await?;
        check_affected(self.name(), "update", affected);
        Ok(affected)
    }

    pub async fn delete<E>(&self, record: &Record, exec: &E) -> Result<u64, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        let keys = self.key_values(record)?;
        debug_log!(entity = %self.name(), "delete");

        let affected = exec.execute_statement(self.schema.delete_sql(), keys).await?;
        check_affected(self.name(), "delete", affected);
        Ok(affected)
    }

    /// Look a row up by key values in declaration order. Extra values are
    /// ignored. `None` when no row matches.
    pub async fn find_by_primary_key<E>(
        &self,
        keys: &[SqlValue],
        exec: &E,
    ) -> Result<Option<Record>, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        let expected = self.schema.primary_keys().len();
        if keys.len() < expected {
            return Err(QueryError::NotEnoughPrimaryKeys {
                entity: self.name().to_string(),
                expected,
                actual: keys.len(),
            }
            .into());
        }

        let rows = exec
            .fetch_rows(
                self.schema.select_by_primary_key_sql(),
                keys[..expected].to_vec(),
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_all<E>(
        &self,
        criteria: &Criteria,
        exec: &E,
    ) -> Result<Vec<Record>, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        runtime::find_all(self.schema.entity(), criteria, exec).await
    }

    pub async fn count<E>(&self, filter: Option<&Filter>, exec: &E) -> Result<i64, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        runtime::count(self.schema.entity(), filter, exec).await
    }

    /// Same rows as [`find_all`](Self::find_all), read through a cursor
    pub async fn stream_all(
        &self,
        criteria: &Criteria,
        manager: &ConnectionManager,
    ) -> Result<RowStream, TableHausError> {
        runtime::stream_all(self.schema.entity(), criteria, manager).await
    }

    /// Create the table from the declared DDL hints when it does not exist
    pub async fn create_table<E>(&self, exec: &E) -> Result<(), TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        let sql = self.schema.create_table_sql();
        tracing::info!(entity = %self.name(), "creating table if missing");
        exec.execute_statement(&sql, Vec::new()).await?;
        Ok(())
    }

    fn key_values(&self, record: &Record) -> Result<Vec<SqlValue>, QueryError> {
        self.schema
            .primary_keys()
            .iter()
            .map(|name| match record.get(name) {
                Some(value) if !value.is_null() => Ok(value.clone()),
                _ => Err(QueryError::MissingPrimaryKey {
                    entity: self.name().to_string(),
                    field: name.clone(),
                }),
            })
            .collect()
    }
}

fn value_or_default(field: &FieldDescriptor, record: &mut Record) -> SqlValue {
    if let Some(value) = record.get(field.attribute()).filter(|value| !value.is_null()) {
        return value.clone();
    }
    match field.default() {
        Some(default) => {
            let value = default.resolve();
            record.set(field.attribute(), value.clone());
            bindable(field, Some(&value))
        }
        None => field.typed_null(),
    }
}
