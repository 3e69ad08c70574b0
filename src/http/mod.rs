//! HTTP request building and execution
//!
//! # Module Structure
//!
//! - [`request`] - Resolves the source and builds the outbound request
//! - [`client`] - Executes the request with the source's timeout and TLS settings
//! - [`response`] - Classifies the response status

pub mod client;
pub mod request;
pub mod response;

pub use client::ResourceClient;
pub use request::{build, Body, HttpRequest, ResolvedSource};
pub use response::validate;
