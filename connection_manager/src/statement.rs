//! Statement execution shared by the pool and by explicit transactions.
//! SQL passed in here is already translated to numbered parameters.

use futures::TryStreamExt;
use sqlx::Postgres;
use type_mapping::{Record, SqlValue};

use crate::binding::{bind_all, decode_row};
use crate::errors::ExecutionError;

pub(crate) async fn fetch_records<'c, E>(
    executor: E,
    sql: &str,
    args: Vec<SqlValue>,
    limit: Option<usize>,
) -> Result<Vec<Record>, ExecutionError>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    if limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut rows = bind_all(sql, args).fetch(executor);
    let mut records = Vec::new();
    while let Some(row) = rows.try_next().await? {
        records.push(decode_row(&row)?);
        if limit.is_some_and(|max| records.len() >= max) {
            break;
        }
    }
    Ok(records)
}

pub(crate) async fn execute<'c, E>(
    executor: E,
    sql: &str,
    args: Vec<SqlValue>,
) -> Result<u64, ExecutionError>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let result = bind_all(sql, args).execute(executor).await?;
    Ok(result.rows_affected())
}
