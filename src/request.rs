//! A minimal view over an already-parsed HTTP/1.1 upgrade request.
//!
//! Parsing the raw request line and header bytes is out of scope for this
//! crate (see the crate-level docs); callers hand in headers they already
//! have, typically from an HTTP server crate sitting in front of this one.

use std::collections::HashMap;

/// The subset of an HTTP/1.1 request the upgrader needs to validate.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub path: String,
    headers: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(path: impl Into<String>, headers: HashMap<String, String>) -> Self {
        HttpRequest {
            path: path.into(),
            headers: lower_keys(headers),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

fn lower_keys(headers: HashMap<String, String>) -> HashMap<String, String> {
    headers
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect()
}
