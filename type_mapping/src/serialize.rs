//! Serialization utilities
//!
//! Bridges application structs to [`Record`]s through `serde_json`, so a
//! typed model can be inserted or read back without hand-written mapping.

use crate::record::Record;
use crate::types::SqlValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl Record {
    /// Build a record from any struct that serializes to a JSON object
    pub fn from_serializable<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(data)? {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key, SqlValue::from_json(value)))
                .collect()),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "expected a struct or map, got {}",
                other
            ))),
        }
    }

    /// Deserialize this record into a typed model
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Order {
        id: String,
        total: f64,
        quantity: i64,
        placed_at: DateTime<Utc>,
        note: Option<String>,
    }

    #[test]
    fn test_struct_round_trip_through_record() {
        let order = Order {
            id: "o1".to_string(),
            total: 9.5,
            quantity: 3,
            placed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            note: None,
        };

        let record = Record::from_serializable(&order).unwrap();
        assert_eq!(record.get("total"), Some(&SqlValue::Float(9.5)));
        assert_eq!(record.get("quantity"), Some(&SqlValue::BigInt(3)));
        assert!(matches!(record.get("placed_at"), Some(SqlValue::Timestamp(_))));
        assert!(record.get("note").unwrap().is_null());

        let back: Order = record.deserialize().unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Record::from_serializable(&vec![1, 2, 3]).is_err());
    }
}
