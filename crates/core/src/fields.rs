//! Dual-name field resolution for loosely-shaped remote JSON.
//!
//! The processing service is inconsistent about naming: the same field
//! may arrive as `progressPercentage` or `progress_percentage`. Every
//! canonical field therefore has an ordered list of wire names, and
//! [`Fields`] resolves them with a fixed precedence: the first name that
//! is present with a non-null value wins. Missing fields resolve to the
//! type's zero value.

use serde_json::{Map, Value};

/// Read-only view over a JSON object with typed, defaulted accessors.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Wrap a JSON value. Returns `None` if the value is not an object.
    pub fn new(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self::from_map)
    }

    pub fn from_map(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// The first present, non-null value among `names`.
    pub fn get(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .filter_map(|name| self.map.get(*name))
            .find(|value| !value.is_null())
    }

    /// String value, or `""` when absent.
    ///
    /// Numbers and booleans are rendered with their JSON text so that
    /// numeric identifiers survive.
    pub fn string(&self, names: &[&str]) -> String {
        self.opt_string(names).unwrap_or_default()
    }

    /// String value, or `None` when absent or not scalar.
    pub fn opt_string(&self, names: &[&str]) -> Option<String> {
        match self.get(names)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Non-negative integer value, or `0` when absent or unparseable.
    ///
    /// Fractional values are rounded; negative values saturate to `0`.
    pub fn u64(&self, names: &[&str]) -> u64 {
        self.opt_u64(names).unwrap_or(0)
    }

    /// Like [`Fields::u64`] but distinguishes an absent field.
    pub fn opt_u64(&self, names: &[&str]) -> Option<u64> {
        let n = self.get(names).and_then(number_as_f64)?;
        if n.is_nan() || n <= 0.0 {
            return Some(0);
        }
        Some(n.round().min(u64::MAX as f64) as u64)
    }

    /// Floating-point value, or `0.0` when absent or unparseable.
    pub fn f64(&self, names: &[&str]) -> f64 {
        self.get(names)
            .and_then(number_as_f64)
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    /// Array elements, or an empty slice when absent or not an array.
    pub fn array(&self, names: &[&str]) -> &'a [Value] {
        match self.get(names) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    /// String elements of an array; non-string elements are skipped.
    pub fn string_list(&self, names: &[&str]) -> Vec<String> {
        self.array(names)
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    /// Nested object, or `None` when absent or not an object.
    pub fn object(&self, names: &[&str]) -> Option<Fields<'a>> {
        self.get(names).and_then(Fields::new)
    }
}

/// Interpret a JSON number or numeric string as `f64`.
pub fn number_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
