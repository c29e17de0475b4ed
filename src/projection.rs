//! Joined projections
//!
//! A read-only entity assembled from several aliased tables. When one field
//! is declared as key, results can be folded into a map keyed by its value.

use std::collections::HashMap;
use std::sync::Arc;

use connection_manager::{ConnectionManager, QueryExecutor, RowStream};
use entity_schema::{compile_joined, EntitySchema, FieldDescriptor, JoinSource, SchemaError};
use type_mapping::{Record, SqlValue};

use crate::criteria::{Criteria, Filter};
use crate::errors::{QueryError, TableHausError};
use crate::runtime;

#[derive(Debug, Clone)]
pub struct JoinedProjection {
    schema: Arc<EntitySchema>,
}

impl JoinedProjection {
    pub fn declare(
        name: &str,
        sources: &[JoinSource],
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: Arc::new(compile_joined(name, sources, fields)?),
        })
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub async fn select<E>(
        &self,
        criteria: &Criteria,
        exec: &E,
    ) -> Result<Vec<Record>, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        runtime::find_all(&self.schema, criteria, exec).await
    }

    /// Fold the rows into a map keyed by the declared key field. A later row
    /// with the same key replaces an earlier one.
    pub async fn select_map<E>(
        &self,
        criteria: &Criteria,
        exec: &E,
    ) -> Result<HashMap<SqlValue, Record>, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        if criteria.has_order_by() {
            return Err(QueryError::OrderByWithFold.into());
        }
        let key = self
            .schema
            .primary_key()
            .ok_or_else(|| QueryError::NoFoldKey(self.name().to_string()))?;

        let rows = runtime::find_all(&self.schema, criteria, exec).await?;
        let mut folded = HashMap::with_capacity(rows.len());
        for row in rows {
            let value = row.get(key).cloned().unwrap_or(SqlValue::Null);
            folded.insert(value, row);
        }
        Ok(folded)
    }

    pub async fn count<E>(&self, filter: Option<&Filter>, exec: &E) -> Result<i64, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        runtime::count(&self.schema, filter, exec).await
    }

    pub async fn stream_all(
        &self,
        criteria: &Criteria,
        manager: &ConnectionManager,
    ) -> Result<RowStream, TableHausError> {
        runtime::stream_all(&self.schema, criteria, manager).await
    }
}
