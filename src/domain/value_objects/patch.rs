use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One requested field value. `Unset` means "this value was never set by the
/// caller" and must never reach the store; `Null` is an explicit clear and
/// persists as JSON null. This is the two-level optional the patch model
/// needs: field mentioned at all vs. explicit clear vs. real value.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Unset,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<PatchValue>),
    Object(BTreeMap<String, PatchValue>),
}

impl PatchValue {
    /// Drops every `Unset` marker: object keys disappear, array elements
    /// disappear. Returns `None` when the value itself is `Unset`.
    pub fn sanitize(self) -> Option<Value> {
        match self {
            PatchValue::Unset => None,
            PatchValue::Null => Some(Value::Null),
            PatchValue::Bool(value) => Some(Value::Bool(value)),
            PatchValue::Number(value) => Some(Value::Number(value)),
            PatchValue::String(value) => Some(Value::String(value)),
            PatchValue::Array(items) => Some(Value::Array(
                items.into_iter().filter_map(PatchValue::sanitize).collect(),
            )),
            PatchValue::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    if let Some(value) = value.sanitize() {
                        map.insert(key, value);
                    }
                }
                Some(Value::Object(map))
            }
        }
    }
}

impl From<Value> for PatchValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PatchValue::Null,
            Value::Bool(value) => PatchValue::Bool(value),
            Value::Number(value) => PatchValue::Number(value),
            Value::String(value) => PatchValue::String(value),
            Value::Array(items) => {
                PatchValue::Array(items.into_iter().map(PatchValue::from).collect())
            }
            Value::Object(entries) => PatchValue::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, PatchValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for PatchValue {
    fn from(value: bool) -> Self {
        PatchValue::Bool(value)
    }
}

impl From<&str> for PatchValue {
    fn from(value: &str) -> Self {
        PatchValue::String(value.to_string())
    }
}

impl From<String> for PatchValue {
    fn from(value: String) -> Self {
        PatchValue::String(value)
    }
}

impl From<i64> for PatchValue {
    fn from(value: i64) -> Self {
        PatchValue::Number(value.into())
    }
}

/// Sparse field -> value map describing a requested mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(BTreeMap<String, PatchValue>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(
            fields
                .into_iter()
                .map(|(key, value)| (key, PatchValue::from(value)))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Strips `Unset` markers recursively and yields the plain JSON field
    /// document that may cross the write boundary. The hard rule: no unset
    /// marker is ever persisted, under any nesting.
    pub fn sanitize(self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in self.0 {
            if let Some(value) = value.sanitize() {
                map.insert(key, value);
            }
        }
        map
    }
}
