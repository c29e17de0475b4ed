//! Read-only views

use std::sync::Arc;

use connection_manager::{ConnectionManager, QueryExecutor, RowStream};
use entity_schema::{compile_view, EntitySchema, FieldDescriptor, SchemaError};
use type_mapping::Record;

use crate::criteria::{Criteria, Filter};
use crate::errors::TableHausError;
use crate::runtime;

#[derive(Debug, Clone)]
pub struct View {
    schema: Arc<EntitySchema>,
}

impl View {
    /// Compile a view. With no fields declared every column is selected.
    pub fn declare(view: &str, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: Arc::new(compile_view(view, fields)?),
        })
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub async fn find_all<E>(
        &self,
        criteria: &Criteria,
        exec: &E,
    ) -> Result<Vec<Record>, TableHausError>
    where
        E: QueryExecutor + ?Sized,
    {
        runtime::find_all(&self.schema, criteria, exec).await
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
