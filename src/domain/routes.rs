//! Route identity used to key per-view state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one navigable view instance: path plus query string.
///
/// Two instances of the same route template with different query
/// parameters (`/search?q=fire` and `/search?q=flood`) are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(path: &str, query: &str) -> Self {
        let query = query.trim_start_matches('?');
        if query.is_empty() {
            Self(path.to_string())
        } else {
            Self(format!("{path}?{query}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn path(&self) -> &str {
        self.0.split_once('?').map_or(self.0.as_str(), |(path, _)| path)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteKey {
    fn from(value: &str) -> Self {
        match value.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(value, ""),
        }
    }
}

impl AsRef<str> for RouteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
