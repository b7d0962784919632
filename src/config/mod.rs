//! Configuration management for pagesmith.
//!
//! A pagesmith site is described by a single TOML file (`pagesmith.toml` by
//! default) declaring the templates and layouts to compile, where partials
//! live, which static text files to serve and the pages themselves.
//!
//! # File Format
//!
//! ```toml
//! listen = "127.0.0.1:8080"
//! partials_dir = "partials"
//!
//! [templates]
//! post = "templates/post.hbs"
//!
//! [layouts]
//! main = "layouts/main.hbs"
//!
//! [static_txt]
//! "/robots.txt" = "static/robots.txt"
//!
//! [errors]
//! not_found = "static/404.html"
//!
//! [client]
//! cache_ttl = "1m"
//! timeout = "10s"
//! max_retries = 2
//!
//! [[pages]]
//! name = "post"
//! url_pattern = "/posts/:id"
//! template = "post"
//! layout = "main"
//! cache_ttl = "30m"
//! backend = "https://api.example.com/posts/:id"
//! ```
//!
//! Relative paths are resolved against the directory containing the
//! configuration file, so a site can be started from any working directory.
//!
//! # Validation
//!
//! [`Config::load_from`] validates the parsed file before returning it:
//! every page must reference a declared template (and layout, when set),
//! page names must be unique, no two routes may differ only in parameter
//! names, URL patterns and `[static_txt]` paths must be absolute and every
//! `:param` of a backend URL must be captured by the page's URL pattern. Typos in template names come back with a suggestion.

mod duration;
mod page;

pub use duration::{DurationError, parse_duration};
pub use page::Page;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::constants::{
    DEFAULT_CLIENT_CACHE_TTL, DEFAULT_CLIENT_MAX_RETRIES, DEFAULT_CLIENT_TIMEOUT,
    DEFAULT_LISTEN_ADDR,
};

/// A configuration file parsed successfully but describes an invalid site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A page references a template that is not declared under `[templates]`
    #[error("page '{page}' references unknown template '{template}'")]
    UnknownTemplate {
        page: String,
        template: String,
        suggestion: Option<String>,
    },

    /// A page references a layout that is not declared under `[layouts]`
    #[error("page '{page}' references unknown layout '{layout}'")]
    UnknownLayout {
        page: String,
        layout: String,
        suggestion: Option<String>,
    },

    /// Two pages share a name
    #[error("duplicate page name '{name}'")]
    DuplicatePage { name: String },

    /// Two routes match the same paths once parameter names are ignored
    #[error("URL pattern '{pattern}' conflicts with '{existing}'")]
    DuplicateRoute { pattern: String, existing: String },

    /// A URL pattern is not an absolute path
    #[error("page '{page}' has invalid URL pattern '{pattern}': must start with '/'")]
    InvalidRoute { page: String, pattern: String },

    /// A `[static_txt]` request path is not an absolute path
    #[error("static_txt path '{path}' must start with '/'")]
    InvalidStaticPath { path: String },

    /// A backend placeholder has no matching URL pattern parameter
    #[error("page '{page}' backend uses ':{param}' which its URL pattern does not capture")]
    UnboundParameter { page: String, param: String },
}

impl ConfigError {
    /// Closest declared name to the one that was not found, if any.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnknownTemplate {
                suggestion,
                ..
            }
            | Self::UnknownLayout {
                suggestion,
                ..
            } => suggestion.as_deref(),
            _ => None,
        }
    }
}

/// Replacement files for the built-in error pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPages {
    /// Served with status 404 for unknown routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found: Option<PathBuf>,

    /// Served with status 500 when a page fails to render
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_error: Option<PathBuf>,
}

/// Settings of the HTTP client used to query page backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// How long successful backend responses are cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,

    /// Timeout of a single backend request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Retries after a transport failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<usize>,
}

impl ClientConfig {
    /// Cache lifetime for backend responses.
    pub fn cache_ttl(&self) -> Duration {
        duration_or(self.cache_ttl.as_deref(), DEFAULT_CLIENT_CACHE_TTL, "client.cache_ttl")
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        duration_or(self.timeout.as_deref(), DEFAULT_CLIENT_TIMEOUT, "client.timeout")
    }

    /// Retries after transport failures.
    pub fn max_retries(&self) -> usize {
        self.max_retries.unwrap_or(DEFAULT_CLIENT_MAX_RETRIES)
    }
}

fn duration_or(value: Option<&str>, default: Duration, key: &str) -> Duration {
    let Some(value) = value else {
        return default;
    };
    parse_duration(value).unwrap_or_else(|e| {
        warn!(key, error = %e, "Using default duration");
        default
    })
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid"));

/// Shape of a route as the router sees it: parameter names are dropped, so
/// `/posts/:id` and `/posts/:slug` share the shape `/posts/:`.
pub fn route_shape(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.chars().next() {
            Some(':') => ":",
            Some('*') => "*",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace every `:param` placeholder in `pattern` with its value from
/// `params`, in a single pass.
///
/// Substituted values are never rescanned, and placeholders without a
/// value are left as they are.
pub fn fill_placeholders<'a, F>(pattern: &str, value_of: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    PLACEHOLDER
        .replace_all(pattern, |captures: &Captures| match value_of(&captures[1]) {
            Some(value) => value.to_string(),
            None => captures[0].to_string(),
        })
        .into_owned()
}

/// Names of the `:param` placeholders in a URL pattern.
///
/// Port numbers such as `:8080` are not placeholders.
pub fn placeholders(pattern: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(pattern)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str())
        .collect()
}

fn default_listen() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

/// The site configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory partials are loaded from; defaults to the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partials_dir: Option<PathBuf>,

    /// Template name to source file
    #[serde(default)]
    pub templates: BTreeMap<String, PathBuf>,

    /// Layout name to source file
    #[serde(default)]
    pub layouts: BTreeMap<String, PathBuf>,

    /// Request path to a file served verbatim as text
    #[serde(default)]
    pub static_txt: BTreeMap<String, PathBuf>,

    /// Custom error pages
    #[serde(default)]
    pub errors: ErrorPages,

    /// Backend client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Pages served by the site
    #[serde(default)]
    pub pages: Vec<Page>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            partials_dir: None,
            templates: BTreeMap::new(),
            layouts: BTreeMap::new(),
            static_txt: BTreeMap::new(),
            errors: ErrorPages::default(),
            client: ClientConfig::default(),
            pages: Vec::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// fails [`validate`](Self::validate).
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self::from_toml_str(&content, base_dir)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration text, resolving relative paths
    /// against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Replace the base directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Resolve a configured path against the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Root directory searched for partials.
    pub fn partials_root(&self) -> PathBuf {
        match &self.partials_dir {
            Some(dir) => self.resolve_path(dir),
            None => self.base_dir.clone(),
        }
    }

    /// Look up a page by name.
    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.name == name)
    }

    /// Check cross references and uniqueness constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        let mut routes: HashMap<String, &str> = HashMap::new();

        for path in self.static_txt.keys() {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidStaticPath {
                    path: path.clone(),
                });
            }
            routes.insert(route_shape(path), path);
        }

        for page in &self.pages {
            if !names.insert(page.name.as_str()) {
                return Err(ConfigError::DuplicatePage {
                    name: page.name.clone(),
                });
            }

            if !page.url_pattern.starts_with('/') {
                return Err(ConfigError::InvalidRoute {
                    page: page.name.clone(),
                    pattern: page.url_pattern.clone(),
                });
            }
            if let Some(existing) = routes.insert(route_shape(&page.url_pattern), &page.url_pattern) {
                return Err(ConfigError::DuplicateRoute {
                    pattern: page.url_pattern.clone(),
                    existing: existing.to_string(),
                });
            }

            if !self.templates.contains_key(&page.template) {
                return Err(ConfigError::UnknownTemplate {
                    page: page.name.clone(),
                    template: page.template.clone(),
                    suggestion: closest_name(&page.template, self.templates.keys()),
                });
            }

            if let Some(layout) = &page.layout {
                if !self.layouts.contains_key(layout) {
                    return Err(ConfigError::UnknownLayout {
                        page: page.name.clone(),
                        layout: layout.clone(),
                        suggestion: closest_name(layout, self.layouts.keys()),
                    });
                }
            }

            if let Some(backend) = page.backend() {
                let captured = placeholders(&page.url_pattern);
                if let Some(param) = placeholders(backend).into_iter().find(|p| !captured.contains(p)) {
                    return Err(ConfigError::UnboundParameter {
                        page: page.name.clone(),
                        param: param.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Pick the declared name closest to `wanted`, if it is close enough to be
/// a plausible typo.
fn closest_name<'a>(wanted: &str, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
    candidates
        .map(|candidate| (strsim::jaro_winkler(wanted, candidate), candidate))
        .filter(|(score, _)| *score >= 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.clone())
}
