//! Executing `HttpRequest` values.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. `UreqTransport` is the
//! blocking production implementation; `RecordingTransport` replays canned
//! responses and keeps every request it was handed, for tests and for callers
//! that want to exercise their own code without a server.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip and returns the response as data.
///
/// Non-2xx statuses are responses, not errors; only a failure to obtain a
/// response at all is reported as `ApiError::Transport`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        // Status codes are interpreted by the mapper, not by ureq.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .timeout_connect(Some(config.connect_timeout()))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &request.headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &request.headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), &request.headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &request.headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// In-memory transport that answers from a queue and records requests.
///
/// When the queue is exhausted it answers with a transport error.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.respond_with(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    /// Queue a `201 Created` with a `Location` header and an empty body.
    pub fn respond_created(&self, location: &str) -> &Self {
        self.respond_with(HttpResponse {
            status: 201,
            headers: vec![("Location".to_string(), location.to_string())],
            body: String::new(),
        })
    }

    pub fn respond_with(&self, response: HttpResponse) -> &Self {
        self.responses.borrow_mut().push_back(Ok(response));
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(&self, message: &str) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(Err(ApiError::Transport(message.to_string())));
        self
    }

    /// Every request executed so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no response queued".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn recording_transport_replays_in_order() {
        let transport = RecordingTransport::new();
        transport.respond(200, "first").respond(404, "");

        let first = transport.execute(&get("http://x/a")).unwrap();
        let second = transport.execute(&get("http://x/b")).unwrap();
        assert_eq!(first.body, "first");
        assert_eq!(second.status, 404);

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://x/a", "http://x/b"]);
    }

    #[test]
    fn exhausted_queue_is_a_transport_error() {
        let transport = RecordingTransport::new();
        let err = transport.execute(&get("http://x/a")).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn queued_failure_is_returned() {
        let transport = RecordingTransport::new();
        transport.fail("connection refused");
        let err = (&transport).execute(&get("http://x/a")).unwrap_err();
        assert_eq!(err.to_string(), "transport failed: connection refused");
    }
}
