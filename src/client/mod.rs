//! Backend access for dynamic pages.
//!
//! [`Fetcher`] is the seam between response generators and the network: the
//! server wires in a [`CachedClient`], tests substitute stubs.

mod cached;

pub use cached::CachedClient;

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Raw answer of a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Build a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A backend could not be reached or did not produce a complete answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, protocol or body transfer failure
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The request exceeded the client timeout
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The URL could not be turned into a request
    #[error("invalid backend URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl { .. })
    }

    pub(crate) fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_builder() {
            Self::InvalidUrl {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Something that can GET a URL.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch `url`, returning the status and body of the answer.
    ///
    /// Non-success statuses are not errors at this level.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}
