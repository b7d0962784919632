//! Response generators produce the data a page is rendered with.
//!
//! A page without a backend always renders its fixed `extra` payload
//! ([`ResponseGenerator::Static`]). A page with a backend queries it on every
//! request, substituting path parameters into the backend URL pattern, and
//! decodes the JSON answer ([`ResponseGenerator::Dynamic`]).
//!
//! # Example
//!
//! ```rust
//! use pagesmith::generator::{PageRequest, ResponseGenerator};
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let generator = ResponseGenerator::fixed(json!({"title": "About"}));
//! let data = generator.generate(&PageRequest::new().with_param("id", "7")).await.unwrap();
//! assert_eq!(data, json!({"title": "About"}));
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::client::{FetchError, Fetcher};
use crate::config::{Page, fill_placeholders};

/// Request data available to a generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Path parameters captured by the page's URL pattern
    pub params: HashMap<String, String>,
    /// Query string parameters
    pub query: HashMap<String, String>,
}

impl PageRequest {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}

/// Shape the backend body is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// A single JSON object
    Object,
    /// A JSON array
    Array,
}

impl DecodeMode {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Object => "a JSON object",
            Self::Array => "a JSON array",
        }
    }
}

/// Generating page data failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The backend could not be reached
    #[error(transparent)]
    Transport(#[from] FetchError),

    /// The backend answered with a non-success status
    #[error("backend {url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The backend body is not the expected JSON
    #[error("cannot decode response of {url}: {message}")]
    Decode { url: String, message: String },
}

impl GenerateError {
    /// Short classification, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status {
                ..
            } => "status",
            Self::Decode {
                ..
            } => "decode",
        }
    }
}

/// Produces the data value for a request.
#[derive(Clone)]
pub enum ResponseGenerator {
    /// Returns a fixed payload
    Static { payload: Value },
    /// Queries a backend
    Dynamic { url_pattern: String, client: Arc<dyn Fetcher>, decode: DecodeMode },
}

impl ResponseGenerator {
    /// Generator returning `payload` for every request.
    pub fn fixed(payload: Value) -> Self {
        Self::Static {
            payload,
        }
    }

    /// Generator querying `url_pattern` through `client`.
    pub fn backend(url_pattern: impl Into<String>, client: Arc<dyn Fetcher>, decode: DecodeMode) -> Self {
        Self::Dynamic {
            url_pattern: url_pattern.into(),
            client,
            decode,
        }
    }

    /// Generator matching a page's configuration.
    pub fn for_page(page: &Page, client: Arc<dyn Fetcher>) -> Self {
        match page.backend() {
            None => Self::fixed(page.extra.clone()),
            Some(url_pattern) => {
                let decode = if page.is_array {
                    DecodeMode::Array
                } else {
                    DecodeMode::Object
                };
                Self::backend(url_pattern, client, decode)
            }
        }
    }

    /// Produce the data for `request`.
    pub async fn generate(&self, request: &PageRequest) -> Result<Value, GenerateError> {
        match self {
            Self::Static {
                payload,
            } => Ok(payload.clone()),
            Self::Dynamic {
                url_pattern,
                client,
                decode,
            } => {
                let url = build_url(url_pattern, &request.params);
                let response = client.fetch(&url).await?;
                if !response.is_success() {
                    return Err(GenerateError::Status {
                        url,
                        status: response.status,
                    });
                }

                let value: Value =
                    serde_json::from_slice(&response.body).map_err(|e| GenerateError::Decode {
                        url: url.clone(),
                        message: e.to_string(),
                    })?;
                if !decode.accepts(&value) {
                    return Err(GenerateError::Decode {
                        url,
                        message: format!("expected {}", decode.expected()),
                    });
                }
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for ResponseGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static {
                ..
            } => f.write_str("ResponseGenerator::Static"),
            Self::Dynamic {
                url_pattern,
                decode,
                ..
            } => f
                .debug_struct("ResponseGenerator::Dynamic")
                .field("url_pattern", url_pattern)
                .field("decode", decode)
                .finish(),
        }
    }
}

/// Substitute `:name` placeholders in `pattern` with request parameters.
///
/// Placeholders are matched whole, so `:id` never touches `:idx`, and
/// parameter values are inserted as-is without being substituted again.
/// Placeholders without a matching parameter are left untouched.
pub fn build_url(pattern: &str, params: &HashMap<String, String>) -> String {
    fill_placeholders(pattern, |name| params.get(name).map(String::as_str))
}
