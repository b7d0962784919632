//! Page definitions.
//!
//! A page binds a URL pattern to a template (optionally wrapped in a layout)
//! and to the source of its data: either a backend URL queried per request or
//! a fixed `extra` payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use super::duration::parse_duration;
use crate::broker::Topic;
use crate::constants::DEFAULT_PAGE_CACHE_TTL;

/// One `[[pages]]` entry of the configuration file.
///
/// ```toml
/// [[pages]]
/// name = "post"
/// url_pattern = "/posts/:id"
/// template = "post"
/// layout = "main"
/// cache_ttl = "30m"
/// backend = "https://api.example.com/posts/:id"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Unique page name, used in logs and by `pagesmith render`
    pub name: String,

    /// Route served by this page; `:param` segments capture path parameters
    pub url_pattern: String,

    /// Name of the `[templates]` entry rendering the page body
    pub template: String,

    /// Name of the `[layouts]` entry wrapping the body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Cache lifetime advertised in `Cache-Control`, e.g. `"1h"`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cache_ttl: String,

    /// Backend URL pattern; `:param` placeholders take request values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Whether the backend answers with a JSON array instead of an object
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,

    /// Human-readable name shown in logs and listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Fixed data rendered when there is no backend
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extra: Value,
}

impl Page {
    /// Broker topic delivering this page's renderer.
    pub fn topic(&self) -> Topic {
        Topic::new(&self.template, self.layout.as_deref())
    }

    /// Backend URL pattern, treating an empty string as absent.
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Whether responses are produced by querying a backend.
    pub fn is_dynamic(&self) -> bool {
        self.backend().is_some()
    }

    /// Name for display purposes.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Parsed cache lifetime.
    ///
    /// Falls back to one hour when the value is empty or unparseable.
    pub fn cache_ttl(&self) -> Duration {
        if self.cache_ttl.trim().is_empty() {
            return DEFAULT_PAGE_CACHE_TTL;
        }
        match parse_duration(&self.cache_ttl) {
            Ok(ttl) => ttl,
            Err(e) => {
                warn!(page = %self.name, error = %e, "Using default cache TTL");
                DEFAULT_PAGE_CACHE_TTL
            }
        }
    }

    /// `Cache-Control` header value for responses of this page.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_ttl().as_secs())
    }
}
