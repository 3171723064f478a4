//! Plain key/value records exchanged with the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceDescriptor;

/// One entity instance as an ordered JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Server-assigned id, once persisted.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only keys the descriptor declares, dropping server-owned keys as well.
    pub fn retain_declared(&mut self, descriptor: &ResourceDescriptor) {
        self.0.retain(|key, _| descriptor.has_field(key));
    }

    /// Remove every field the descriptor marks create-only.
    pub fn strip_create_only(&mut self, descriptor: &ResourceDescriptor) {
        for (key, spec) in &descriptor.fields {
            if spec.create_only {
                self.0.shift_remove(key);
            }
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSpec;
    use serde_json::json;

    fn users() -> ResourceDescriptor {
        ResourceDescriptor::new("users", "Users", "users")
            .field("name", FieldSpec::text("Name"))
            .field("password", FieldSpec::password("Password").create_only())
    }

    #[test]
    fn test_record_accessors() {
        let record = Record::try_from(json!({
            "id": 7,
            "name": "Ana",
            "created_at": "2025-01-01T00:00:00"
        }))
        .unwrap();

        assert_eq!(record.id(), Some(7));
        assert_eq!(record.get("name"), Some(&json!("Ana")));
        assert!(record.get("updated_at").is_none());
    }

    #[test]
    fn test_record_rejects_non_object() {
        assert!(Record::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_strip_and_retain() {
        let d = users();
        let mut record = Record::try_from(json!({
            "id": 1,
            "name": "Ana",
            "password": "secret",
            "extra": true
        }))
        .unwrap();

        record.retain_declared(&d);
        assert_eq!(
            record.clone().into_value(),
            json!({ "name": "Ana", "password": "secret" })
        );

        record.strip_create_only(&d);
        assert_eq!(record.into_value(), json!({ "name": "Ana" }));
    }
}
