use std::collections::BTreeMap;

use crate::sql::Column;

/// One request parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
    /// Select-list entries (`custom_columns`, `add_columns`).
    Columns(Vec<Column>),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Scalar(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Scalar(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Scalar(i.to_string())
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Scalar(i.to_string())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        ParamValue::List(items.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

impl From<Vec<Column>> for ParamValue {
    fn from(columns: Vec<Column>) -> Self {
        ParamValue::Columns(columns)
    }
}

/// Filter parameters for one request, keyed by name.
///
/// Two presence tests exist and they are not interchangeable: `is_set` is
/// true for any present key, `is_filled` additionally rejects the empty
/// string, `"0"` and empty lists. Which one a rule uses decides whether an
/// explicit zero filters anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_filled(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(ParamValue::Scalar(s)) => !s.is_empty() && s != "0",
            Some(ParamValue::List(items)) => !items.is_empty(),
            Some(ParamValue::Columns(columns)) => !columns.is_empty(),
            None => false,
        }
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(ParamValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Filter value as comma-joined text; lists are joined.
    pub fn joined(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(ParamValue::Scalar(s)) => Some(s.clone()),
            Some(ParamValue::List(items)) => Some(items.join(",")),
            _ => None,
        }
    }

    /// List items; a scalar is split on commas.
    pub fn list(&self, key: &str) -> Vec<&str> {
        match self.0.get(key) {
            Some(ParamValue::List(items)) => items.iter().map(String::as_str).collect(),
            Some(ParamValue::Scalar(s)) if !s.is_empty() => s.split(',').collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains_in(&self, key: &str, item: &str) -> bool {
        self.list(key).contains(&item)
    }

    pub fn columns(&self, key: &str) -> Option<&[Column]> {
        match self.0.get(key) {
            Some(ParamValue::Columns(columns)) => Some(columns.as_slice()),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
