//! Placeholder Namespace
//!
//! Maps placeholder names to lazily resolved value sources: literal params,
//! files written by upstream steps, and build environment variables.

use super::env::{BuildEnv, BUILD_VARIABLES};
use crate::error::{ActionError, Result};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Prefix marking a param value as a file reference
pub const FILE_PREFIX: &str = "file:";

/// Where a placeholder's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    /// Param value used as given (nested `file:` strings still resolve)
    Literal(Value),
    /// Contents of a file relative to the working directory
    FileRef(PathBuf),
    /// One of the captured build variables
    EnvVar(&'static str),
}

impl ValueSource {
    /// Classify a raw param value
    pub fn from_param(value: Value) -> Self {
        match file_reference(&value) {
            Some(path) => ValueSource::FileRef(path),
            None => ValueSource::Literal(value),
        }
    }

    /// Produce the substitution value, `None` if the source has nothing to offer
    pub fn resolve(&self, files: &FileCache, env: &BuildEnv) -> Result<Option<Value>> {
        match self {
            ValueSource::Literal(value) => resolve_file_refs(value, files).map(Some),
            ValueSource::FileRef(path) => files.read(path).map(Some),
            ValueSource::EnvVar(name) => Ok(env.get(name).map(|v| Value::String(v.to_string()))),
        }
    }
}

fn file_reference(value: &Value) -> Option<PathBuf> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix(FILE_PREFIX))
        .map(PathBuf::from)
}

/// Replace every `file:` string inside a param structure with file contents
fn resolve_file_refs(value: &Value, files: &FileCache) -> Result<Value> {
    match value {
        Value::String(_) => match file_reference(value) {
            Some(path) => files.read(&path),
            None => Ok(value.clone()),
        },
        Value::Object(map) => {
            let mut resolved = Map::with_capacity(map.len());
            for (k, v) in map {
                resolved.insert(k.clone(), resolve_file_refs(v, files)?);
            }
            Ok(Value::Object(resolved))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| resolve_file_refs(v, files))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Reads `file:` references relative to a working directory, at most once per path
#[derive(Debug)]
pub struct FileCache {
    base_dir: PathBuf,
    cache: RefCell<HashMap<PathBuf, Value>>,
    reads: Cell<usize>,
}

impl FileCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: RefCell::new(HashMap::new()),
            reads: Cell::new(0),
        }
    }

    /// Number of files actually read from disk
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Return the (trimmed) contents of a file, reading it on first use
    pub fn read(&self, relative: &Path) -> Result<Value> {
        let path = self.base_dir.join(relative);

        if let Some(value) = self.cache.borrow().get(&path) {
            return Ok(value.clone());
        }

        tracing::debug!("Reading parameter file {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|source| ActionError::Resolution {
            path: path.clone(),
            source,
        })?;
        self.reads.set(self.reads.get() + 1);

        let value = parse_file_contents(&contents);
        self.cache.borrow_mut().insert(path, value.clone());
        Ok(value)
    }
}

/// Trimmed text, or the parsed structure when the file holds a JSON object/array
fn parse_file_contents(contents: &str) -> Value {
    let trimmed = contents.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }

    Value::String(trimmed.to_string())
}

/// Everything a placeholder may resolve against during one invocation
#[derive(Debug)]
pub struct Namespace {
    entries: BTreeMap<String, ValueSource>,
    env: BuildEnv,
    files: FileCache,
    resolved: RefCell<HashMap<String, Option<Value>>>,
}

impl Namespace {
    /// Combine params and build variables; params shadow build variables
    pub fn new(params: Map<String, Value>, env: BuildEnv, base_dir: impl Into<PathBuf>) -> Self {
        let mut entries: BTreeMap<String, ValueSource> = BUILD_VARIABLES
            .iter()
            .map(|name| (name.to_string(), ValueSource::EnvVar(*name)))
            .collect();

        for (name, value) in params {
            entries.insert(name, ValueSource::from_param(value));
        }

        Self {
            entries,
            env,
            files: FileCache::new(base_dir),
            resolved: RefCell::new(HashMap::new()),
        }
    }

    /// Namespace holding only build variables
    pub fn build_only(env: BuildEnv, base_dir: impl Into<PathBuf>) -> Self {
        Self::new(Map::new(), env, base_dir)
    }

    pub fn files(&self) -> &FileCache {
        &self.files
    }

    /// Resolve a placeholder name, `None` when nothing provides it
    ///
    /// Each name is resolved once; later lookups reuse the first result.
    pub fn lookup(&self, name: &str) -> Result<Option<Value>> {
        if let Some(value) = self.resolved.borrow().get(name) {
            return Ok(value.clone());
        }

        let value = match self.entries.get(name) {
            Some(source) => source.resolve(&self.files, &self.env)?,
            None => None,
        };

        self.resolved
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_param_classification() {
        assert_eq!(
            ValueSource::from_param(json!("file:out/name")),
            ValueSource::FileRef(PathBuf::from("out/name"))
        );
        assert_eq!(
            ValueSource::from_param(json!("plain")),
            ValueSource::Literal(json!("plain"))
        );
        assert_eq!(
            ValueSource::from_param(json!({"a": 1})),
            ValueSource::Literal(json!({"a": 1}))
        );
    }

    #[test]
    fn test_file_contents_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hostname"), "super_hostname\n").unwrap();

        let ns = Namespace::new(
            params(json!({"hostname": "file:hostname"})),
            BuildEnv::default(),
            dir.path(),
        );
        assert_eq!(ns.lookup("hostname").unwrap(), Some(json!("super_hostname")));
    }

    #[test]
    fn test_json_file_becomes_structure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test.json"), "{\"foo\": \"bar\"}\n").unwrap();

        let ns = Namespace::new(
            params(json!({"foo": "file:test.json"})),
            BuildEnv::default(),
            dir.path(),
        );
        assert_eq!(ns.lookup("foo").unwrap(), Some(json!({"foo": "bar"})));
    }

    #[test]
    fn test_scalar_json_file_stays_text() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("count"), "123").unwrap();

        let ns = Namespace::new(params(json!({"n": "file:count"})), BuildEnv::default(), dir.path());
        assert_eq!(ns.lookup("n").unwrap(), Some(json!("123")));
    }

    #[test]
    fn test_nested_file_refs_resolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hostname"), "super_hostname").unwrap();

        let ns = Namespace::new(
            params(json!({
                "spec": {"image": {"tag": "file:hostname"}, "list": ["file:hostname", 1]}
            })),
            BuildEnv::default(),
            dir.path(),
        );
        assert_eq!(
            ns.lookup("spec").unwrap(),
            Some(json!({"image": {"tag": "super_hostname"}, "list": ["super_hostname", 1]}))
        );
    }

    #[test]
    fn test_file_read_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hostname"), "host").unwrap();

        let ns = Namespace::new(
            params(json!({
                "a": "file:hostname",
                "b": {"nested": "file:hostname"}
            })),
            BuildEnv::default(),
            dir.path(),
        );
        ns.lookup("a").unwrap();
        ns.lookup("a").unwrap();
        ns.lookup("b").unwrap();

        // Still served from the cache after the file disappears
        std::fs::remove_file(dir.path().join("hostname")).unwrap();
        assert_eq!(ns.lookup("a").unwrap(), Some(json!("host")));
        assert_eq!(ns.files().reads(), 1);
    }

    #[test]
    fn test_missing_file_is_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let ns = Namespace::new(params(json!({"x": "file:nope"})), BuildEnv::default(), dir.path());

        let err = ns.lookup("x").unwrap_err();
        assert!(matches!(err, ActionError::Resolution { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_params_shadow_build_variables() {
        let env = BuildEnv::from_pairs([("BUILD_NAME", "7")]);
        let ns = Namespace::new(params(json!({"BUILD_NAME": "override"})), env, ".");
        assert_eq!(ns.lookup("BUILD_NAME").unwrap(), Some(json!("override")));
    }

    #[test]
    fn test_build_variables_and_unknown_names() {
        let env = BuildEnv::from_pairs([("BUILD_ID", "99")]);
        let ns = Namespace::build_only(env, ".");
        assert_eq!(ns.lookup("BUILD_ID").unwrap(), Some(json!("99")));
        assert_eq!(ns.lookup("BUILD_TEAM_NAME").unwrap(), None);
        assert_eq!(ns.lookup("nothing").unwrap(), None);
    }
}
