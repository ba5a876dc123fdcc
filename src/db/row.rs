use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One fetched cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// NUMERIC, e.g. `SUM()` over BIGINT columns.
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(Value),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int16(i) => i.to_string(),
            CellValue::Int32(i) => i.to_string(),
            CellValue::Int64(i) => i.to_string(),
            CellValue::Float32(f) => f.to_string(),
            CellValue::Float64(f) => f.to_string(),
            CellValue::Decimal(d) => d.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bytes(b) => format!("[{} bytes]", b.len()),
            CellValue::Date(d) => d.to_string(),
            CellValue::Time(t) => t.to_string(),
            CellValue::DateTime(dt) => dt.to_string(),
            CellValue::TimestampTz(dt) => dt.to_string(),
            CellValue::Json(j) => j.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Integer view, used for generated identifiers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int16(i) => Some(i64::from(*i)),
            CellValue::Int32(i) => Some(i64::from(*i)),
            CellValue::Int64(i) => Some(*i),
            CellValue::Decimal(d) if d.fract().is_zero() => i64::try_from(*d).ok(),
            CellValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int16(i) => Value::from(*i),
            CellValue::Int32(i) => Value::from(*i),
            CellValue::Int64(i) => Value::from(*i),
            CellValue::Float32(f) => Value::from(f64::from(*f)),
            CellValue::Float64(f) => Value::from(*f),
            CellValue::Json(j) => j.clone(),
            other => Value::String(other.display()),
        }
    }
}

/// A fetched row: column name → value, in result-set order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Vec<(String, CellValue)>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: CellValue) -> Self {
        self.0.push((column.to_string(), value));
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, CellValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

/// Rows re-keyed by the display value of a primary-key column.
///
/// A later row with an already-seen key replaces the earlier one but keeps
/// its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedRows {
    rows: Vec<(String, Record)>,
    index: HashMap<String, usize>,
}

impl KeyedRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, record: Record) {
        match self.index.get(&key) {
            Some(&i) => self.rows[i].1 = record,
            None => {
                self.index.insert(key.clone(), self.rows.len());
                self.rows.push((key, record));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.rows[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, Record)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .rows
            .iter()
            .map(|(k, r)| (k.clone(), r.to_json()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.display(), "NULL");
        assert_eq!(CellValue::Bool(true).display(), "true");
        assert_eq!(CellValue::Int32(-100).display(), "-100");
        assert_eq!(CellValue::Float64(2.5).display(), "2.5");
        assert_eq!(CellValue::Bytes(vec![1, 2, 3]).display(), "[3 bytes]");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(CellValue::Date(date).display(), "2024-02-29");
    }

    #[test]
    fn test_decimal_cells_stay_exact() {
        let total = CellValue::Decimal(dec!(12345678901234567890.25));
        assert_eq!(total.display(), "12345678901234567890.25");
        assert_eq!(
            total.to_json(),
            serde_json::json!("12345678901234567890.25")
        );
        assert_eq!(CellValue::Decimal(dec!(41)).as_i64(), Some(41));
        assert_eq!(CellValue::Decimal(dec!(4.5)).as_i64(), None);
    }

    #[test]
    fn test_cell_as_i64() {
        assert_eq!(CellValue::Int16(7).as_i64(), Some(7));
        assert_eq!(CellValue::Int64(9_999_999_999).as_i64(), Some(9_999_999_999));
        assert_eq!(CellValue::Text("42".into()).as_i64(), Some(42));
        assert_eq!(CellValue::Text("x".into()).as_i64(), None);
        assert_eq!(CellValue::Null.as_i64(), None);
    }

    #[test]
    fn test_record_to_json() {
        let record = Record::new()
            .with("zone_id", CellValue::Int32(3))
            .with("name", CellValue::Text("Header".into()))
            .with("type", CellValue::Null);
        assert_eq!(
            record.to_json(),
            serde_json::json!({"zone_id": 3, "name": "Header", "type": null})
        );
        assert_eq!(record.get("name"), Some(&CellValue::Text("Header".into())));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_keyed_rows_replace_in_place() {
        let mut rows = KeyedRows::new();
        rows.insert("2".into(), Record::new().with("v", CellValue::Int32(1)));
        rows.insert("1".into(), Record::new().with("v", CellValue::Int32(2)));
        rows.insert("2".into(), Record::new().with("v", CellValue::Int32(3)));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.keys().collect::<Vec<_>>(), vec!["2", "1"]);
        assert_eq!(rows.get("2").unwrap().get("v"), Some(&CellValue::Int32(3)));
    }
}
