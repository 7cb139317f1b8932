//! Placeholder resolution against the variable store.
//!
//! Two syntaxes are recognized, applied in this order: `${name}` then
//! `{{name}}`. Each syntax is a single non-overlapping regex pass; there is no
//! escaping and no nesting. Unknown names resolve to empty text.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::domain::variables::VariableStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderSyntax {
    /// `${name}`
    Dollar,
    /// `{{name}}`
    Braces,
}

impl PlaceholderSyntax {
    fn pattern(self) -> &'static Regex {
        static DOLLAR: OnceLock<Regex> = OnceLock::new();
        static BRACES: OnceLock<Regex> = OnceLock::new();
        match self {
            Self::Dollar => DOLLAR.get_or_init(|| {
                Regex::new(r"\$\{([^}]+)\}").expect("dollar placeholder pattern is valid")
            }),
            Self::Braces => BRACES.get_or_init(|| {
                Regex::new(r"\{\{([^}]+)\}\}").expect("brace placeholder pattern is valid")
            }),
        }
    }
}

/// PlaceholderResolver は設定値の `${name}` / `{{name}}` を置換する
///
/// Side-effect free: the store is only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderResolver {
    syntaxes: Vec<PlaceholderSyntax>,
}

impl PlaceholderResolver {
    pub fn new(syntaxes: impl Into<Vec<PlaceholderSyntax>>) -> Self {
        Self {
            syntaxes: syntaxes.into(),
        }
    }

    /// Resolver for hosts that only understand `${name}`.
    pub fn dollar_only() -> Self {
        Self::new([PlaceholderSyntax::Dollar])
    }

    pub fn syntaxes(&self) -> &[PlaceholderSyntax] {
        &self.syntaxes
    }

    /// Resolve a raw configuration value. Non-strings are returned unchanged.
    pub fn resolve(&self, value: &Value, store: &VariableStore) -> Value {
        match value {
            Value::String(text) => Value::String(self.resolve_str(text, store)),
            other => other.clone(),
        }
    }

    pub fn resolve_str(&self, text: &str, store: &VariableStore) -> String {
        let mut resolved = text.to_string();
        for syntax in &self.syntaxes {
            resolved = syntax
                .pattern()
                .replace_all(&resolved, |caps: &Captures<'_>| lookup(&caps[1], store))
                .into_owned();
        }
        resolved
    }
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::new([PlaceholderSyntax::Dollar, PlaceholderSyntax::Braces])
    }
}

fn lookup(identifier: &str, store: &VariableStore) -> String {
    store
        .get(identifier.trim())
        .map(stringify)
        .unwrap_or_default()
}

/// Text form of a stored value as it appears after substitution.
///
/// Integral floats print without a fractional part (`5.0` → `5`), arrays
/// join their elements with `,`, objects render as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
