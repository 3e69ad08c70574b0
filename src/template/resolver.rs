//! Placeholder resolver for request templates.
//!
//! Rewrites `{name}` placeholders found in string leaves of a JSON tree,
//! pulling values from a [`Namespace`].
//!
//! - A string that is exactly one resolvable placeholder is replaced by the
//!   resolved value itself, keeping its JSON type (object, array, ...).
//! - Placeholders mixed with other text are replaced inline; non-string
//!   values are inserted as compact JSON.
//! - Unknown names are left verbatim, braces included.
//! - Substituted text is never scanned again.

use super::namespace::Namespace;
use crate::error::Result;
use serde_json::{Map, Value};

/// Resolves placeholders against one invocation's namespace.
pub struct Resolver<'a> {
    namespace: &'a Namespace,
}

impl<'a> Resolver<'a> {
    pub fn new(namespace: &'a Namespace) -> Self {
        Self { namespace }
    }

    /// Resolve every placeholder in a JSON value tree.
    ///
    /// Objects keep their keys and key order, arrays keep their order,
    /// numbers, booleans and null come back unchanged.
    pub fn resolve_value(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => self.resolve_string(s),
            Value::Object(map) => {
                let mut resolved = Map::with_capacity(map.len());
                for (k, v) in map {
                    resolved.insert(k.clone(), self.resolve_value(v)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => {
                let resolved: Result<Vec<Value>> =
                    items.iter().map(|v| self.resolve_value(v)).collect();
                Ok(Value::Array(resolved?))
            }
            other => Ok(other.clone()),
        }
    }

    /// Resolve a string that must stay a string (URIs, header values).
    pub fn render(&self, s: &str) -> Result<String> {
        Ok(match self.resolve_string(s)? {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }

    fn resolve_string(&self, s: &str) -> Result<Value> {
        let placeholders = find_placeholders(s);

        if placeholders.is_empty() {
            return Ok(Value::String(s.to_string()));
        }

        // Whole-field placeholder keeps the resolved value's type
        if let [only] = placeholders.as_slice() {
            if only.start == 0 && only.end == s.len() {
                return Ok(self
                    .namespace
                    .lookup(only.name)?
                    .unwrap_or_else(|| Value::String(s.to_string())));
            }
        }

        let mut result = String::with_capacity(s.len());
        let mut cursor = 0;
        for placeholder in &placeholders {
            result.push_str(&s[cursor..placeholder.start]);
            match self.namespace.lookup(placeholder.name)? {
                Some(Value::String(text)) => result.push_str(&text),
                Some(other) => result.push_str(&other.to_string()),
                None => result.push_str(&s[placeholder.start..placeholder.end]),
            }
            cursor = placeholder.end;
        }
        result.push_str(&s[cursor..]);

        Ok(Value::String(result))
    }
}

/// A `{name}` occurrence; `start..end` covers the braces.
#[derive(Debug, PartialEq, Eq)]
struct Placeholder<'s> {
    start: usize,
    end: usize,
    name: &'s str,
}

/// Find all non-overlapping `{name}` placeholders, left to right.
///
/// Names follow identifier rules, so JSON-looking text such as `{"a": 1}`
/// is not mistaken for a placeholder.
fn find_placeholders(s: &str) -> Vec<Placeholder<'_>> {
    let bytes = s.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let name_start = i + 1;
        let mut j = name_start;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }

        let is_name = j > name_start && !bytes[name_start].is_ascii_digit();
        if is_name && j < bytes.len() && bytes[j] == b'}' {
            found.push(Placeholder {
                start: i,
                end: j + 1,
                name: &s[name_start..j],
            });
            i = j + 1;
        } else {
            i += 1;
        }
    }

    found
}
