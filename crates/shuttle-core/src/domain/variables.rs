//! Variable store adapter.
//!
//! The host owns the variable store for the whole orchestration session; a
//! worker borrows it for one task and may add or overwrite entries. Values
//! are kept as raw JSON: no namespacing, no coercion on write.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// VariableStore は task に渡される共有 key-value ストア
///
/// A store that arrived as something other than a JSON object is *detached*:
/// lookups see nothing and writes are dropped. This mirrors how a malformed
/// host payload is tolerated instead of failing the task.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableStore {
    entries: Option<Map<String, Value>>,
}

impl VariableStore {
    /// An empty, writable store.
    pub fn new() -> Self {
        Self {
            entries: Some(Map::new()),
        }
    }

    /// A store that ignores every write.
    pub fn detached() -> Self {
        Self { entries: None }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(entries) => Self {
                entries: Some(entries),
            },
            _ => Self::detached(),
        }
    }

    pub fn is_detached(&self) -> bool {
        self.entries.is_none()
    }

    /// Look up `key`. A key stored with `null` is still present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.as_ref()?.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite `key`.
    ///
    /// No-op when `key` is empty or the store is detached.
    pub fn set(&mut self, key: &str, value: Value) {
        if key.is_empty() {
            return;
        }
        if let Some(entries) = self.entries.as_mut() {
            entries.insert(key.to_string(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detached stores convert to `null`.
    pub fn into_value(self) -> Value {
        self.entries.map_or(Value::Null, Value::Object)
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for VariableStore {
    fn from(entries: Map<String, Value>) -> Self {
        Self {
            entries: Some(entries),
        }
    }
}

impl Serialize for VariableStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.entries {
            Some(entries) => entries.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for VariableStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}
