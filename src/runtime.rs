//! Operations shared by every entity kind

use connection_manager::{ConnectionManager, QueryExecutor, RowStream};
use entity_schema::{EntitySchema, FieldDescriptor};
use type_mapping::{Record, SqlValue};

use crate::criteria::{Criteria, Filter};
use crate::errors::TableHausError;
use crate::{debug_log, trace_log};

pub(crate) async fn find_all<E>(
    schema: &EntitySchema,
    criteria: &Criteria,
    exec: &E,
) -> Result<Vec<Record>, TableHausError>
where
    E: QueryExecutor + ?Sized,
{
    let (sql, args) = criteria.render(schema.select_sql())?;
    debug_log!(entity = %schema.name(), sql = %sql, "select");
    let rows = exec.fetch_rows(&sql, args, None).await?;
    trace_log!(entity = %schema.name(), rows = rows.len(), "select finished");
    Ok(rows)
}

pub(crate) async fn count<E>(
    schema: &EntitySchema,
    filter: Option<&Filter>,
    exec: &E,
) -> Result<i64, TableHausError>
where
    E: QueryExecutor + ?Sized,
{
    let mut sql = schema.count_sql().to_string();
    let mut args = Vec::new();
    if let Some(filter) = filter {
        filter.append(&mut sql, &mut args);
    }
    debug_log!(entity = %schema.name(), sql = %sql, "count");

    let rows = exec.fetch_rows(&sql, args, Some(1)).await?;
    Ok(rows
        .first()
        .and_then(|row| row.iter().next())
        .and_then(|(_, value)| value.as_i64())
        .unwrap_or(0))
}

pub(crate) async fn stream_all(
    schema: &EntitySchema,
    criteria: &Criteria,
    manager: &ConnectionManager,
) -> Result<RowStream, TableHausError> {
    let (sql, args) = criteria.render(schema.select_sql())?;
    debug_log!(entity = %schema.name(), sql = %sql, "stream");
    Ok(manager.streaming_query(&sql, args).await?)
}

/// Statements on a single entity instance should touch exactly one row
pub(crate) fn check_affected(entity: &str, operation: &'static str, affected: u64) {
    if affected != 1 {
        tracing::warn!(entity = %entity, operation, affected, "expected exactly one affected row");
    }
}

/// Absent values are bound as a NULL of the column's type
pub(crate) fn bindable(field: &FieldDescriptor, value: Option<&SqlValue>) -> SqlValue {
    match value {
        Some(value) if !value.is_null() => value.clone(),
        _ => field.typed_null(),
    }
}
