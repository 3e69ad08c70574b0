//! Request construction
//!
//! Turns a resolved source into a transport-ready [`HttpRequest`].

use crate::config::Source;
use crate::error::{ActionError, Result};
use crate::template::Resolver;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use url::Url;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Request body before encoding
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Form(Map<String, Value>),
    Empty,
}

/// Source with every placeholder resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub uri: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Body,
}

impl ResolvedSource {
    /// Resolve the URI, header values and body of a source
    pub fn resolve(source: &Source, resolver: &Resolver<'_>) -> Result<Self> {
        let uri = resolver.render(&source.uri)?;

        let mut headers = BTreeMap::new();
        for (name, value) in &source.headers {
            headers.insert(name.clone(), resolver.render(value)?);
        }

        let body = if let Some(json) = &source.json {
            Body::Json(resolver.resolve_value(json)?)
        } else if let Some(form) = &source.form_data {
            match resolver.resolve_value(form)? {
                Value::Object(fields) => Body::Form(fields),
                _ => return Err(ActionError::protocol("source.form_data must be a mapping")),
            }
        } else {
            Body::Empty
        };

        Ok(Self {
            uri,
            method: source.method.clone(),
            headers,
            body,
        })
    }
}

/// Basic authentication credentials lifted out of the URI
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A fully built outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Target URL with credentials removed
    pub url: Url,
    pub credentials: Option<BasicAuth>,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Build the outbound request from a resolved source
pub fn build(resolved: &ResolvedSource) -> Result<HttpRequest> {
    let mut url = Url::parse(resolved.uri.trim())
        .map_err(|e| ActionError::protocol(format!("source.uri is not a valid URL: {e}")))?;
    let credentials = take_credentials(&mut url)?;
    let method = parse_method(&resolved.method)?;

    let mut headers = HeaderMap::new();
    let body = match &resolved.body {
        Body::Json(value) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            Some(serde_json::to_string(value)?)
        }
        Body::Form(fields) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FORM));
            Some(encode_form(fields)?)
        }
        Body::Empty => None,
    };

    for (name, value) in &resolved.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ActionError::protocol(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ActionError::protocol(format!("invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }

    if credentials.is_some() && headers.contains_key(AUTHORIZATION) {
        return Err(ActionError::protocol(
            "source.uri credentials conflict with an explicit Authorization header",
        ));
    }

    tracing::debug!(
        "Built request: {} {} (auth: {}, body: {} bytes)",
        method,
        url,
        credentials.is_some(),
        body.as_ref().map_or(0, String::len)
    );

    Ok(HttpRequest {
        method,
        url,
        credentials,
        headers,
        body,
    })
}

/// Normalize a method name to an uppercase HTTP method
pub fn parse_method(method: &str) -> Result<Method> {
    let upper = method.trim().to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes())
        .map_err(|_| ActionError::protocol(format!("invalid HTTP method '{method}'")))
}

/// Strip `user:password@` from the URL, returning the decoded credentials
fn take_credentials(url: &mut Url) -> Result<Option<BasicAuth>> {
    if url.username().is_empty() && url.password().is_none() {
        return Ok(None);
    }

    let decode = |part: &str| {
        urlencoding::decode(part)
            .map(|s| s.into_owned())
            .map_err(|_| ActionError::protocol("credentials in source.uri are not valid UTF-8"))
    };

    let username = decode(url.username())?;
    let password = url.password().map(decode).transpose()?;

    url.set_username("")
        .and_then(|_| url.set_password(None))
        .map_err(|_| ActionError::protocol("cannot remove credentials from source.uri"))?;

    Ok(Some(BasicAuth { username, password }))
}

/// URL-encode form fields, each value JSON-encoded first
pub fn encode_form(fields: &Map<String, Value>) -> Result<String> {
    let mut pairs = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let encoded = to_field_json(value)?;
        pairs.push(format!(
            "{}={}",
            urlencoding::encode(name),
            urlencoding::encode(&encoded)
        ));
    }
    Ok(pairs.join("&"))
}

/// JSON text for a form field: `{"test": 123}`, non-ASCII kept as-is
pub fn to_field_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| ActionError::protocol(e.to_string()))
}

/// Compact JSON with a space after `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
