//! Runtime values
//!
//! [`SqlValue`] is what the entity runtime binds to placeholders and what the
//! connection manager decodes result columns into.

use crate::column::ColumnType;
use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A single bound or decoded value.
///
/// Equality and hashing treat floats by bit pattern so values can key a map.
/// Integers compare by value whatever their width, and every NULL (typed or
/// not) compares equal to every other NULL.
#[derive(Debug, Clone)]
pub enum SqlValue {
    Null,
    /// NULL carrying the declared column type so the driver binds a matching parameter type
    TypedNull(ColumnType),
    Boolean(bool),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null | SqlValue::TypedNull(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of any integral variant
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::SmallInt(v) => Some(i64::from(*v)),
            SqlValue::Integer(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating view of any numeric variant
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(v) => Some(*v),
            SqlValue::SmallInt(v) => Some(f64::from(*v)),
            SqlValue::Integer(v) => Some(f64::from(*v)),
            SqlValue::BigInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Short variant name used in logs and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => "null",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::SmallInt(_) => "smallint",
            SqlValue::Integer(_) => "integer",
            SqlValue::BigInt(_) => "bigint",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Json(_) => "json",
        }
    }

    /// Convert into a JSON value (timestamps as RFC 3339, uuids as strings)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => serde_json::Value::Null,
            SqlValue::Boolean(b) => serde_json::Value::Bool(*b),
            SqlValue::SmallInt(v) => serde_json::Value::from(*v),
            SqlValue::Integer(v) => serde_json::Value::from(*v),
            SqlValue::BigInt(v) => serde_json::Value::from(*v),
            SqlValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            SqlValue::Text(s) => serde_json::Value::String(s.clone()),
            SqlValue::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            SqlValue::Uuid(id) => serde_json::Value::String(id.to_string()),
            SqlValue::Json(v) => v.clone(),
        }
    }

    /// Convert a JSON value into the closest runtime value
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => {
                // Try to parse as RFC3339 timestamp first
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    SqlValue::Timestamp(dt.with_timezone(&Utc))
                } else {
                    SqlValue::Text(s)
                }
            }
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::BigInt(i)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::Float(f)
                } else {
                    SqlValue::Json(serde_json::Value::Number(n))
                }
            }
            serde_json::Value::Bool(b) => SqlValue::Boolean(b),
            serde_json::Value::Null => SqlValue::Null,
            other => SqlValue::Json(other),
        }
    }
}

impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_null() && b.is_null() => true,
            (SqlValue::Boolean(a), SqlValue::Boolean(b)) => a == b,
            (
                SqlValue::SmallInt(_) | SqlValue::Integer(_) | SqlValue::BigInt(_),
                SqlValue::SmallInt(_) | SqlValue::Integer(_) | SqlValue::BigInt(_),
            ) => self.as_i64() == other.as_i64(),
            (SqlValue::Float(a), SqlValue::Float(b)) => a.to_bits() == b.to_bits(),
            (SqlValue::Text(a), SqlValue::Text(b)) => a == b,
            (SqlValue::Timestamp(a), SqlValue::Timestamp(b)) => a == b,
            (SqlValue::Uuid(a), SqlValue::Uuid(b)) => a == b,
            (SqlValue::Json(a), SqlValue::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SqlValue {}

impl Hash for SqlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => 0u8.hash(state),
            SqlValue::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            SqlValue::SmallInt(_) | SqlValue::Integer(_) | SqlValue::BigInt(_) => {
                2u8.hash(state);
                self.as_i64().hash(state);
            }
            SqlValue::Float(v) => {
                5u8.hash(state);
                v.to_bits().hash(state);
            }
            SqlValue::Text(s) => {
                6u8.hash(state);
                s.hash(state);
            }
            SqlValue::Timestamp(ts) => {
                7u8.hash(state);
                ts.hash(state);
            }
            SqlValue::Uuid(id) => {
                8u8.hash(state);
                id.hash(state);
            }
            SqlValue::Json(v) => {
                9u8.hash(state);
                v.to_string().hash(state);
            }
        }
    }
}

impl From<String> for SqlValue {
    fn from(val: String) -> Self {
        SqlValue::Text(val)
    }
}

impl From<&str> for SqlValue {
    fn from(val: &str) -> Self {
        SqlValue::Text(val.to_string())
    }
}

impl From<bool> for SqlValue {
    fn from(val: bool) -> Self {
        SqlValue::Boolean(val)
    }
}

impl From<i16> for SqlValue {
    fn from(val: i16) -> Self {
        SqlValue::SmallInt(val)
    }
}

impl From<i32> for SqlValue {
    fn from(val: i32) -> Self {
        SqlValue::Integer(val)
    }
}

impl From<i64> for SqlValue {
    fn from(val: i64) -> Self {
        SqlValue::BigInt(val)
    }
}

impl From<f32> for SqlValue {
    fn from(val: f32) -> Self {
        SqlValue::Float(f64::from(val))
    }
}

impl From<f64> for SqlValue {
    fn from(val: f64) -> Self {
        SqlValue::Float(val)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(val: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(val)
    }
}

impl From<Uuid> for SqlValue {
    fn from(val: Uuid) -> Self {
        SqlValue::Uuid(val)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(val: serde_json::Value) -> Self {
        SqlValue::Json(val)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Typed extraction used by [`Record::get_as`](crate::Record::get_as)
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Uuid(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSqlValue for i16 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_i64().and_then(|v| i16::try_from(v).ok())
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_i64()
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_timestamp()
    }
}

impl FromSqlValue for Uuid {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Uuid(id) => Some(*id),
            SqlValue::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for serde_json::Value {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.to_json())
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}
