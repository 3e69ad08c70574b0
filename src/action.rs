//! Resource Actions
//!
//! The three entry points the orchestrator invokes: `check`, `in` and `out`.
//! Each performs the configured HTTP call once and reports the result.

use crate::config::{ResourceInput, Source, Version};
use crate::error::Result;
use crate::http::{self, ResolvedSource, ResourceClient};
use crate::template::{BuildEnv, Namespace, Resolver};
use clap::ValueEnum;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Resource action, selected by executable name or first argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Check,
    In,
    Out,
}

impl Action {
    /// Map an executable name (`/opt/resource/out`) to an action
    pub fn from_program_name(program: &str) -> Option<Self> {
        let name = Path::new(program).file_name()?.to_str()?;
        match name {
            "check" => Some(Action::Check),
            "in" => Some(Action::In),
            "out" => Some(Action::Out),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Check => "check",
            Action::In => "in",
            Action::Out => "out",
        }
    }
}

/// Metadata entry shown by the orchestrator next to a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// Result of `in` and `out`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub version: Version,
    pub metadata: Vec<MetadataField>,
}

impl Output {
    /// Echo a version back with no metadata
    pub fn echo(version: Version) -> Self {
        Self {
            version,
            metadata: Vec::new(),
        }
    }
}

/// Run an action and produce the JSON document for stdout
pub async fn run(
    action: Action,
    input: &ResourceInput,
    env: BuildEnv,
    dir: &Path,
) -> Result<Value> {
    tracing::info!(
        "Running {} against {} {}",
        action.name(),
        input.source.method,
        redact(&input.source.uri)
    );

    let output = match action {
        Action::Check => serde_json::to_value(check(input, env).await?)?,
        Action::In => serde_json::to_value(get(input, env, dir).await?)?,
        Action::Out => serde_json::to_value(put(input, env, dir).await?)?,
    };

    Ok(output)
}

/// The `check` action: call the endpoint, report no new versions
///
/// Only build variables are available as placeholders.
pub async fn check(input: &ResourceInput, env: BuildEnv) -> Result<Vec<Version>> {
    let namespace = Namespace::build_only(env, ".");
    perform(&input.source, &namespace).await?;
    Ok(Vec::new())
}

/// The `in` action: call the endpoint, echo the requested version
///
/// `file:` params resolve relative to the destination directory.
pub async fn get(input: &ResourceInput, env: BuildEnv, destination: &Path) -> Result<Output> {
    let namespace = Namespace::new(input.params(), env, destination);
    perform(&input.source, &namespace).await?;
    Ok(Output::echo(input.version()))
}

/// The `out` action: resolve params, call the endpoint, echo the version
///
/// `file:` params resolve relative to the build's working directory.
pub async fn put(input: &ResourceInput, env: BuildEnv, work_dir: &Path) -> Result<Output> {
    let namespace = Namespace::new(input.params(), env, work_dir);
    perform(&input.source, &namespace).await?;
    Ok(Output::echo(input.version()))
}

/// Resolve, build, send and validate one request
async fn perform(source: &Source, namespace: &Namespace) -> Result<StatusCode> {
    let resolver = Resolver::new(namespace);
    let resolved = ResolvedSource::resolve(source, &resolver)?;
    let request = http::build(&resolved)?;

    let client = ResourceClient::new(source)?;
    let response = client.execute(request).await?;
    http::validate(response).await
}

/// URI with any `user:password@` part masked, for logging
fn redact(uri: &str) -> String {
    match url::Url::parse(uri) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("***");
            let _ = url.set_password(None);
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => uri.to_string(),
    }
}
