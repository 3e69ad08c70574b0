//! Pipeline resource that performs one templated HTTP call.
//!
//! # Architecture
//!
//! - [`action`] - `check` / `in` / `out` entry points
//! - [`config`] - Source configuration and stdin payloads
//! - [`template`] - `{name}` placeholder resolution
//! - [`http`] - Request building, execution and status validation
//! - [`error`] - Error kinds reported by an action

pub mod action;
pub mod config;
pub mod error;
pub mod http;
pub mod template;

pub use action::{Action, Output};
pub use config::{ResourceInput, Source, SslVerify, Version};
pub use error::{ActionError, Result};
