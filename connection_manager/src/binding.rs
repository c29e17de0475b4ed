//! Value binding and row decoding
//!
//! Every argument is bound as a parameter, never interpolated into SQL text.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo};
use type_mapping::{ColumnType, Record, SqlValue};
use uuid::Uuid;

use crate::errors::ExecutionError;

pub(crate) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub(crate) fn bind_value(query: PgQuery<'_>, value: SqlValue) -> PgQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::TypedNull(column_type) => bind_typed_null(query, column_type),
        SqlValue::Boolean(b) => query.bind(b),
        SqlValue::SmallInt(i) => query.bind(i),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::BigInt(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Timestamp(ts) => query.bind(ts),
        SqlValue::Uuid(id) => query.bind(id),
        SqlValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}

fn bind_typed_null(query: PgQuery<'_>, column_type: ColumnType) -> PgQuery<'_> {
    match column_type {
        ColumnType::String | ColumnType::Text => query.bind(Option::<String>::None),
        ColumnType::Boolean => query.bind(Option::<bool>::None),
        ColumnType::Integer => query.bind(Option::<i64>::None),
        ColumnType::SmallInt => query.bind(Option::<i16>::None),
        ColumnType::Float => query.bind(Option::<f64>::None),
        ColumnType::DateTime => query.bind(Option::<DateTime<Utc>>::None),
    }
}

pub(crate) fn bind_all(sql: &str, args: Vec<SqlValue>) -> PgQuery<'_> {
    args.into_iter()
        .fold(sqlx::query(sql), |query, value| bind_value(query, value))
}

/// Decode a row into a record keyed by column label
pub(crate) fn decode_row(row: &PgRow) -> Result<Record, ExecutionError> {
    let mut record = Record::with_capacity(row.len());
    for column in row.columns() {
        let index = column.ordinal();
        let value = match column.type_info().name() {
            "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(SqlValue::Boolean),
            "INT2" => row.try_get::<Option<i16>, _>(index)?.map(SqlValue::SmallInt),
            "INT4" => row.try_get::<Option<i32>, _>(index)?.map(SqlValue::Integer),
            "INT8" => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::BigInt),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(index)?
                .map(|f| SqlValue::Float(f64::from(f))),
            "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(SqlValue::Float),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text)
            }
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(index)?
                .map(SqlValue::Timestamp),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(index)?
                .map(|ts| SqlValue::Timestamp(ts.and_utc())),
            "UUID" => row.try_get::<Option<Uuid>, _>(index)?.map(SqlValue::Uuid),
            "JSON" | "JSONB" => row
                .try_get::<Option<serde_json::Value>, _>(index)?
                .map(SqlValue::Json),
            other => {
                return Err(ExecutionError::UnsupportedColumnType {
                    column: column.name().to_string(),
                    type_name: other.to_string(),
                })
            }
        };
        record.set(column.name(), value.unwrap_or(SqlValue::Null));
    }
    Ok(record)
}
