//! Named value store shared by the processors of one walk.

use std::collections::BTreeMap;

use crate::value::Value;

/// Mapping of argument name to typed value.
///
/// Written by processors as they match input, read by later processors,
/// edges, completers and executors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    values: BTreeMap<String, Value>,
}

impl Data {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String value, if present and a string.
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean value; an absent key reads as `false`.
    pub fn boolean(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    pub fn strings(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            Value::StringList(v) => Some(v),
            _ => None,
        }
    }

    pub fn ints(&self, key: &str) -> Option<&[i64]> {
        match self.get(key)? {
            Value::IntList(v) => Some(v),
            _ => None,
        }
    }

    pub fn floats(&self, key: &str) -> Option<&[f64]> {
        match self.get(key)? {
            Value::FloatList(v) => Some(v),
            _ => None,
        }
    }

    pub fn bools(&self, key: &str) -> Option<&[bool]> {
        match self.get(key)? {
            Value::BoolList(v) => Some(v),
            _ => None,
        }
    }
}
