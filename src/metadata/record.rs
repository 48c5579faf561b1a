//! Shape-checked access to one loosely typed metadata record.

use crate::error::InspectError;
use serde_json::{Map, Value};

/// JSON shape name used in shape errors.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed reader over a record's fields. Every accessor returns `None` for an
/// absent or `null` field and records a shape error for a mismatched one.
pub(crate) struct RecordReader<'a> {
    label: String,
    fields: &'a Map<String, Value>,
    issues: Vec<InspectError>,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(label: String, fields: &'a Map<String, Value>) -> Self {
        Self {
            label,
            fields,
            issues: Vec::new(),
        }
    }

    pub(crate) fn into_issues(self) -> Vec<InspectError> {
        self.issues
    }

    fn field(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    fn mismatch(&mut self, field: &str, expected: &'static str, found: &Value) {
        self.issues.push(crate::err!(MetadataShape {
            record: self.label.clone(),
            field: field.to_string(),
            expected: expected,
            found: json_kind(found),
        }));
    }

    pub(crate) fn string(&mut self, name: &str) -> Option<String> {
        let value = self.field(name)?;
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch(name, "string", other);
                None
            }
        }
    }

    pub(crate) fn boolean(&mut self, name: &str) -> Option<bool> {
        let value = self.field(name)?;
        match value {
            Value::Bool(b) => Some(*b),
            other => {
                self.mismatch(name, "boolean", other);
                None
            }
        }
    }

    pub(crate) fn integer(&mut self, name: &str) -> Option<i64> {
        let value = self.field(name)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.mismatch(name, "integer", value);
                None
            }
        }
    }

    /// A bound that may be written as a string or a number; kept as text.
    pub(crate) fn string_or_number(&mut self, name: &str) -> Option<String> {
        let value = self.field(name)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.mismatch(name, "string or number", other);
                None
            }
        }
    }

    pub(crate) fn string_list(&mut self, name: &str) -> Option<Vec<String>> {
        let value = self.field(name)?;
        let strings = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });
        if strings.is_none() {
            self.mismatch(name, "array of strings", value);
        }
        strings
    }

    pub(crate) fn array(&mut self, name: &str) -> Option<Vec<Value>> {
        let value = self.field(name)?;
        match value {
            Value::Array(items) => Some(items.clone()),
            other => {
                self.mismatch(name, "array", other);
                None
            }
        }
    }

    /// Any JSON value, untouched.
    pub(crate) fn any(&self, name: &str) -> Option<Value> {
        self.field(name).cloned()
    }
}
