//! Request templating
//!
//! Resolves `{name}` placeholders inside the request description before it
//! is turned into an HTTP request.
//!
//! # Module Structure
//!
//! - [`env`] - Build metadata captured from the environment
//! - [`namespace`] - Placeholder value sources and the file cache
//! - [`resolver`] - Placeholder scanning and structural resolution
//!
//! # Example
//!
//! ```ignore
//! use http_resource::template::{BuildEnv, Namespace, Resolver};
//!
//! let ns = Namespace::new(params, BuildEnv::from_env(), "/tmp/build/put");
//! let body = Resolver::new(&ns).resolve_value(&source_json)?;
//! ```

pub mod env;
pub mod namespace;
pub mod resolver;

pub use env::{BuildEnv, BUILD_VARIABLES};
pub use namespace::{FileCache, Namespace, ValueSource, FILE_PREFIX};
pub use resolver::Resolver;
