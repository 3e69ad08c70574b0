//! Resource Configuration
//!
//! Defines the `source` block supplied by the pipeline definition and the
//! JSON payloads the orchestrator writes to stdin.

use crate::error::{ActionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Environment variable that switches logging to DEBUG on stderr
pub const DEBUG_ENV: &str = "RESOURCE_DEBUG";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Opaque version token owned by the orchestrator
pub type Version = BTreeMap<String, String>;

/// TLS verification setting
///
/// Accepts either a boolean or a PEM-encoded CA certificate to trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SslVerify {
    Enabled(bool),
    CaCertificate(String),
}

impl Default for SslVerify {
    fn default() -> Self {
        SslVerify::Enabled(true)
    }
}

/// Resource source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Target URI, may embed `user:password@` credentials
    #[serde(default)]
    pub uri: String,
    /// HTTP method (case-insensitive)
    #[serde(default = "default_method")]
    pub method: String,
    /// Structure sent as a JSON body
    #[serde(default)]
    pub json: Option<Value>,
    /// Fields sent as a URL-encoded form, each value JSON-encoded
    #[serde(default)]
    pub form_data: Option<Value>,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// TLS verification
    #[serde(default)]
    pub ssl_verify: SslVerify,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Log at DEBUG level to stderr
    #[serde(default)]
    pub debug: bool,
}

fn default_method() -> String {
    "GET".into()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Source {
    /// Create a source for the given URI with every other field defaulted
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            method: default_method(),
            json: None,
            form_data: None,
            headers: BTreeMap::new(),
            ssl_verify: SslVerify::default(),
            timeout: DEFAULT_TIMEOUT_SECS,
            debug: false,
        }
    }

    /// Check the fields that can be rejected before any side effect
    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(ActionError::protocol("source.uri is required"));
        }

        if self.json.is_some() && self.form_data.is_some() {
            return Err(ActionError::protocol(
                "source.json and source.form_data are mutually exclusive",
            ));
        }

        if let Some(form) = &self.form_data {
            if !form.is_object() {
                return Err(ActionError::protocol("source.form_data must be a mapping"));
            }
        }

        if self.timeout == 0 {
            return Err(ActionError::protocol("source.timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Payload read from stdin for every action
///
/// `check` ignores `params`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInput {
    pub source: Source,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
    #[serde(default)]
    pub version: Option<Version>,
}

impl ResourceInput {
    /// Decode and validate an invocation payload
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(ActionError::protocol("no input received on stdin"));
        }

        let input: ResourceInput = serde_json::from_str(raw)?;
        input.source.validate()?;
        Ok(input)
    }

    /// Params with `null`/absent collapsed to an empty mapping
    pub fn params(&self) -> Map<String, Value> {
        self.params.clone().unwrap_or_default()
    }

    /// Version with `null`/absent collapsed to an empty mapping
    pub fn version(&self) -> Version {
        self.version.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_input_uses_defaults() {
        let input = ResourceInput::parse(r#"{"source": {"uri": "http://example.com"}}"#).unwrap();
        assert_eq!(input.source.method, "GET");
        assert_eq!(input.source.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(input.source.ssl_verify, SslVerify::Enabled(true));
        assert!(input.params().is_empty());
        assert!(input.version().is_empty());
    }

    #[test]
    fn test_missing_uri_is_protocol_error() {
        let err = ResourceInput::parse(r#"{"source": {"method": "POST"}}"#).unwrap_err();
        assert!(matches!(err, ActionError::Protocol(_)));
        assert!(err.to_string().contains("uri"));
    }

    #[test]
    fn test_missing_source_is_protocol_error() {
        let err = ResourceInput::parse(r#"{"version": {}}"#).unwrap_err();
        assert!(matches!(err, ActionError::Protocol(_)));
    }

    #[test]
    fn test_malformed_json_is_protocol_error() {
        let err = ResourceInput::parse("{{garbage").unwrap_err();
        assert!(matches!(err, ActionError::Protocol(_)));
    }

    #[test]
    fn test_empty_stdin_is_protocol_error() {
        let err = ResourceInput::parse("  \n").unwrap_err();
        assert!(matches!(err, ActionError::Protocol(_)));
    }

    #[test]
    fn test_json_and_form_data_are_exclusive() {
        let raw = json!({
            "source": {
                "uri": "http://example.com",
                "json": {"a": 1},
                "form_data": {"b": 2}
            }
        })
        .to_string();
        let err = ResourceInput::parse(&raw).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_form_data_must_be_mapping() {
        let raw = json!({
            "source": {"uri": "http://example.com", "form_data": ["a"]}
        })
        .to_string();
        assert!(ResourceInput::parse(&raw).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let raw = json!({"source": {"uri": "http://example.com", "timeout": 0}}).to_string();
        assert!(ResourceInput::parse(&raw).is_err());
    }

    #[test]
    fn test_ssl_verify_accepts_bool_and_certificate() {
        let source: Source =
            serde_json::from_value(json!({"uri": "https://x", "ssl_verify": false})).unwrap();
        assert_eq!(source.ssl_verify, SslVerify::Enabled(false));

        let source: Source =
            serde_json::from_value(json!({"uri": "https://x", "ssl_verify": "-----BEGIN"})).unwrap();
        assert_eq!(
            source.ssl_verify,
            SslVerify::CaCertificate("-----BEGIN".to_string())
        );
    }

    #[test]
    fn test_version_passes_through() {
        let raw = json!({
            "source": {"uri": "http://example.com"},
            "version": {"ref": "abc123"}
        })
        .to_string();
        let input = ResourceInput::parse(&raw).unwrap();
        assert_eq!(input.version().get("ref").map(String::as_str), Some("abc123"));
    }

    #[test]
    fn test_null_params_collapse_to_empty() {
        let raw = json!({"source": {"uri": "http://example.com"}, "params": null}).to_string();
        let input = ResourceInput::parse(&raw).unwrap();
        assert!(input.params().is_empty());
    }
}
