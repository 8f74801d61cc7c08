//! HTTP transport implementation.
//!
//! Batches travel as JSON over POST. The HTTP library is abstracted behind
//! a trait so tests can run against an in-process loopback and alternative
//! clients stay possible.

use crate::transport::{BatchOutcome, RemoteTransport};
use std::time::Duration;
use tasksync_protocol::{BatchRequest, BatchResponse};

/// HTTP client abstraction.
///
/// Implement this trait to supply the actual HTTP stack. [`ReqwestClient`]
/// is the blocking reqwest implementation; [`LoopbackClient`] routes
/// requests to an in-process server for tests.
pub trait HttpClient: Send + Sync {
    /// Sends a POST with a JSON body and returns the response body.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;

    /// Bounded-timeout GET; true when the endpoint answers with success.
    fn get_ok(&self, url: &str, timeout: Duration) -> bool;
}

/// HTTP-based transport speaking the JSON batch contract.
///
/// Batches go to `POST {base}/sync/batch`; the connectivity probe targets
/// `GET {base}/health`.
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl<C: HttpClient> RemoteTransport for HttpTransport<C> {
    fn send_batch(&self, request: &BatchRequest) -> BatchOutcome {
        let body = match serde_json::to_vec(request) {
            Ok(body) => body,
            Err(e) => return BatchOutcome::TransportFailure(format!("failed to encode batch: {e}")),
        };

        let url = format!("{}/sync/batch", self.base_url);
        let response = match self.client.post(&url, body) {
            Ok(bytes) => bytes,
            Err(reason) => return BatchOutcome::TransportFailure(reason),
        };

        match serde_json::from_slice::<BatchResponse>(&response) {
            Ok(parsed) => BatchOutcome::Delivered(parsed),
            Err(e) => BatchOutcome::TransportFailure(format!("failed to decode response: {e}")),
        }
    }

    fn probe(&self, timeout: Duration) -> bool {
        self.client
            .get_ok(&format!("{}/health", self.base_url), timeout)
    }
}

/// Blocking HTTP client backed by reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, String> {
        reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map(|client| Self { client })
            .map_err(|e| e.to_string())
    }
}

impl HttpClient for ReqwestClient {
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }

    fn get_ok(&self, url: &str, timeout: Duration) -> bool {
        self.client
            .get(url)
            .timeout(timeout)
            .send()
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}

/// A server that can answer loopback requests in-process.
pub trait LoopbackServer {
    /// Handles a POST and returns the response body.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;

    /// Whether the server currently answers health checks.
    fn healthy(&self) -> bool;
}

/// An HTTP client that routes requests directly to a loopback server.
///
/// Useful for testing the full transport without network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a loopback client over the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        let path = url.find("/sync/").map(|i| &url[i..]).unwrap_or(url);
        self.server.handle_post(path, &body)
    }

    fn get_ok(&self, _url: &str, _timeout: Duration) -> bool {
        self.server.healthy()
    }
}
