//! Task configuration as sent by the host.
//!
//! Settings are a loose name → JSON map taken from `element.settings`. Each
//! module turns them into its own typed config once, at entry; this type only
//! offers the lookups those conversions share.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::domain::variables::VariableStore;
use crate::placeholder::{PlaceholderResolver, stringify};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Pull `settings` out of an element descriptor.
    ///
    /// A missing element, missing `settings`, or non-object `settings` all
    /// yield an empty configuration.
    pub fn from_element(element: &Value) -> Self {
        element
            .get("settings")
            .and_then(Value::as_object)
            .cloned()
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Raw value of a setting. Present-but-null counts as present.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Textual setting with placeholders resolved.
    ///
    /// Non-string values bypass substitution and are stringified as-is;
    /// `null` becomes empty text.
    pub fn text(
        &self,
        name: &str,
        default: &str,
        resolver: &PlaceholderResolver,
        store: &VariableStore,
    ) -> String {
        match self.raw(name) {
            None => resolver.resolve_str(default, store),
            Some(Value::String(raw)) => resolver.resolve_str(raw, store),
            Some(other) => stringify(other),
        }
    }

    /// Numeric setting. Placeholders are never resolved here.
    ///
    /// Every numeric setting is a duration or a count, so a negative value is
    /// as unusable as a non-finite one: both fall back to `default`, as do
    /// empty strings, booleans and `null`.
    pub fn number(&self, name: &str, default: f64) -> f64 {
        self.raw(name).and_then(parse_number).unwrap_or(default)
    }

    /// Millisecond setting as a `Duration`.
    pub fn millis(&self, name: &str, default: Duration) -> Duration {
        self.raw(name)
            .and_then(parse_number)
            .map(|ms| Duration::from_millis(ms.round() as u64))
            .unwrap_or(default)
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}
