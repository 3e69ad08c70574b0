//! Build Environment
//!
//! Build metadata the orchestrator exposes through environment variables,
//! captured once so the resolver never reads the process environment itself.

use std::collections::BTreeMap;

/// Environment variables available as placeholders
pub const BUILD_VARIABLES: &[&str] = &[
    "BUILD_ID",
    "BUILD_NAME",
    "BUILD_JOB_NAME",
    "BUILD_PIPELINE_NAME",
    "BUILD_PIPELINE_INSTANCE_VARS",
    "BUILD_TEAM_NAME",
    "BUILD_CREATED_BY",
    "ATC_EXTERNAL_URL",
];

/// Immutable snapshot of the build metadata variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    values: BTreeMap<&'static str, String>,
}

impl BuildEnv {
    /// Capture the recognized variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Capture the recognized variables from an arbitrary lookup
    ///
    /// Names outside [`BUILD_VARIABLES`] are never queried.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = BUILD_VARIABLES
            .iter()
            .filter_map(|name| lookup(name).map(|value| (*name, value)))
            .collect();

        Self { values }
    }

    /// Build an environment from explicit pairs, ignoring unknown names
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs: BTreeMap<&str, &str> = pairs.into_iter().collect();
        Self::from_lookup(|name| pairs.get(name).map(|v| v.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}
