//! Resource HTTP Client
//!
//! Wraps `reqwest::Client` with the timeout and TLS settings from the source.

use super::request::HttpRequest;
use crate::config::{Source, SslVerify};
use crate::error::{ActionError, Result};
use reqwest::{Certificate, Client, Response};
use std::error::Error;

/// User agent sent unless the source overrides it
pub const USER_AGENT: &str = concat!("http-resource/", env!("CARGO_PKG_VERSION"));

const PEM_CERTIFICATE_HEADER: &str = "-----BEGIN CERTIFICATE-----";

/// HTTP client configured for one invocation
#[derive(Clone)]
pub struct ResourceClient {
    client: Client,
}

impl ResourceClient {
    /// Create a client honouring `timeout` and `ssl_verify`
    pub fn new(source: &Source) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(source.timeout());

        match &source.ssl_verify {
            SslVerify::Enabled(true) => {}
            SslVerify::Enabled(false) => {
                tracing::warn!("TLS certificate verification disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
            SslVerify::CaCertificate(pem) => {
                if !pem.contains(PEM_CERTIFICATE_HEADER) {
                    return Err(ActionError::protocol(
                        "source.ssl_verify must be a boolean or a PEM certificate",
                    ));
                }
                let cert = Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                    ActionError::protocol(format!("source.ssl_verify is not a valid PEM certificate: {e}"))
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder
            .build()
            .map_err(|e| ActionError::protocol(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Send the request; any non-HTTP failure becomes a transport error
    pub async fn execute(&self, request: HttpRequest) -> Result<Response> {
        tracing::info!("{} {}", request.method, request.url);

        let uri = request.url.to_string();
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(auth) = request.credentials {
            builder = builder.basic_auth(auth.username, auth.password);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        builder.send().await.map_err(|e| {
            tracing::error!("Request to {} failed: {}", uri, e);
            ActionError::Transport {
                uri,
                message: describe_transport_error(&e),
            }
        })
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request error"
    };

    // reqwest's Display omits the underlying cause (DNS, refused, TLS, ...)
    let mut message = format!("{kind}: {error}");
    let mut cause = error.source();
    while let Some(inner) = cause {
        message.push_str(&format!(": {inner}"));
        cause = inner.source();
    }
    message
}
