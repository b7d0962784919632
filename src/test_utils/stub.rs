//! Canned backend responses.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::client::{FetchError, FetchResponse, Fetcher};

/// A [`Fetcher`] answering from a table of canned responses.
///
/// URLs without an entry answer `404`. Every request is recorded.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Result<FetchResponse, FetchError>>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body`.
    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.set(url, Ok(FetchResponse::new(status, body)));
        self
    }

    /// Fail requests to `url` with `error`.
    pub fn fail(self, url: &str, error: FetchError) -> Self {
        self.set(url, Err(error));
        self
    }

    /// Replace the answer for `url`.
    pub fn set(&self, url: &str, response: Result<FetchResponse, FetchError>) {
        self.responses.lock().unwrap_or_else(|e| e.into_inner()).insert(url.to_string(), response);
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// How often `url` was requested.
    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|call| *call == url).count()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(url.to_string());
        let responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses.get(url).cloned().unwrap_or_else(|| Ok(FetchResponse::new(404, "not found")))
    }
}
