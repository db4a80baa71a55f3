//! Backend trait and implementations for talking to a workspace.
//!
//! This module provides the [`Backend`] trait, a transport-agnostic way to
//! issue one JSON request against the workspace REST API. The production
//! implementation is [`http::HttpBackend`].
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use permissions::backend::{Backend, Method, MockBackend, Request};
//! use serde_json::json;
//!
//! let mut mock = MockBackend::new();
//! mock.respond(Method::Get, "/api/2.0/preview/scim/v2/Me", json!({"userName": "admin"}));
//!
//! let me = mock.execute(&Request::get("/api/2.0/preview/scim/v2/Me")).unwrap();
//! assert_eq!(me["userName"], "admin");
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// HTTP verbs used by the permissions API and its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// POST
    Post,
    /// DELETE
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        write!(f, "{verb}")
    }
}

/// One request against the workspace API.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP verb.
    pub method: Method,
    /// Path below the workspace host, starting with `/api/`.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON body for writes.
    pub body: Option<Value>,
}

impl Request {
    /// Create a request without query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// Backend trait for executing workspace API requests.
///
/// Implementations return the decoded JSON body on success (`Value::Null`
/// for an empty body) and `Error::Api` carrying the status, error code and
/// message for a non-success response.
pub trait Backend: Send + Sync {
    /// Execute a single request.
    fn execute(&self, request: &Request) -> Result<Value>;
}

/// A backend bound to a cancellation token.
///
/// Every call goes through [`Session::send`], which refuses to issue a
/// request once the token is cancelled.
pub struct Session<'a> {
    backend: &'a dyn Backend,
    cancel: &'a CancelToken,
}

impl<'a> Session<'a> {
    /// Bind a backend to a cancellation token.
    pub fn new(backend: &'a dyn Backend, cancel: &'a CancelToken) -> Self {
        Self { backend, cancel }
    }

    /// Send a request unless cancelled.
    pub fn send(&self, request: &Request) -> Result<Value> {
        self.cancel.check()?;
        debug!("{request}");
        self.backend.execute(request)
    }

    /// Send a GET request and decode the response.
    pub fn get<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        let value = self.send(request)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a write request with a JSON body, discarding the response.
    pub fn write<B: Serialize>(&self, method: Method, path: &str, body: &B) -> Result<()> {
        let request = Request::new(method, path).with_body(serde_json::to_value(body)?);
        self.send(&request).map(|_| ())
    }
}

/// Canned response for a mock fixture.
#[derive(Debug, Clone)]
enum MockResponse {
    Json(Value),
    Error {
        status: u16,
        error_code: String,
        message: String,
    },
}

/// A fixture: request matcher plus response.
///
/// `None` in method or path matches anything; an empty query matches any
/// query.
#[derive(Debug, Clone)]
struct Fixture {
    method: Option<Method>,
    path: Option<String>,
    query: Vec<(String, String)>,
    response: MockResponse,
}

impl Fixture {
    fn matches(&self, request: &Request) -> bool {
        self.method.is_none_or(|m| m == request.method)
            && self.path.as_ref().is_none_or(|p| *p == request.path)
            && (self.query.is_empty() || self.query == request.query)
    }
}

/// Mock backend for testing without network access.
///
/// Fixtures are matched in the order they were added and may be reused.
/// Every executed request is recorded. A request with no matching fixture
/// fails with a transport error.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    fixtures: Arc<Mutex<Vec<Fixture>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, fixture: Fixture) {
        lock(&self.fixtures).push(fixture);
    }

    /// Answer `method path` (any query) with a JSON body.
    pub fn respond(&mut self, method: Method, path: impl Into<String>, body: Value) {
        self.add(Fixture {
            method: Some(method),
            path: Some(path.into()),
            query: Vec::new(),
            response: MockResponse::Json(body),
        });
    }

    /// Answer `method path?query` with a JSON body.
    pub fn respond_query(
        &mut self,
        method: Method,
        path: impl Into<String>,
        query: &[(&str, &str)],
        body: Value,
    ) {
        self.add(Fixture {
            method: Some(method),
            path: Some(path.into()),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            response: MockResponse::Json(body),
        });
    }

    /// Answer `method path` (any query) with an API error.
    pub fn fail(
        &mut self,
        method: Method,
        path: impl Into<String>,
        status: u16,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.add(Fixture {
            method: Some(method),
            path: Some(path.into()),
            query: Vec::new(),
            response: MockResponse::Error {
                status,
                error_code: error_code.into(),
                message: message.into(),
            },
        });
    }

    /// Answer every otherwise unmatched request with an API error.
    pub fn fail_any(
        &mut self,
        status: u16,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.add(Fixture {
            method: None,
            path: None,
            query: Vec::new(),
            response: MockResponse::Error {
                status,
                error_code: error_code.into(),
                message: message.into(),
            },
        });
    }

    /// All requests executed so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        lock(&self.requests).clone()
    }

    /// Executed requests other than GETs.
    #[must_use]
    pub fn writes(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::Get)
            .collect()
    }
}

impl Backend for MockBackend {
    fn execute(&self, request: &Request) -> Result<Value> {
        lock(&self.requests).push(request.clone());

        let fixtures = lock(&self.fixtures);
        let fixture = fixtures
            .iter()
            .find(|f| f.matches(request))
            .ok_or_else(|| Error::Transport {
                message: format!("no mock response for {request}"),
            })?;

        match &fixture.response {
            MockResponse::Json(body) => Ok(body.clone()),
            MockResponse::Error {
                status,
                error_code,
                message,
            } => Err(Error::api(*status, error_code.clone(), message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_backend_unmatched() {
        let mock = MockBackend::new();
        let err = mock.execute(&Request::get("/api/2.0/clusters/get")).unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_mock_backend_matches_query() {
        let mut mock = MockBackend::new();
        mock.respond_query(
            Method::Get,
            "/api/2.0/workspace/get-status",
            &[("path", "/a")],
            json!({"object_id": 1}),
        );
        mock.respond_query(
            Method::Get,
            "/api/2.0/workspace/get-status",
            &[("path", "/b")],
            json!({"object_id": 2}),
        );

        let request = Request::get("/api/2.0/workspace/get-status").with_query("path", "/b");
        assert_eq!(mock.execute(&request).unwrap()["object_id"], 2);
    }

    #[test]
    fn test_mock_backend_errors() {
        let mut mock = MockBackend::new();
        mock.fail(Method::Get, "/api/2.0/permissions/clusters/abc", 404, "NOT_FOUND", "gone");
        mock.fail_any(400, "INVALID_REQUEST", "Internal error happened");

        let err = mock
            .execute(&Request::get("/api/2.0/permissions/clusters/abc"))
            .unwrap_err();
        assert!(err.is_not_found());

        let err = mock
            .execute(&Request::new(Method::Put, "/anything"))
            .unwrap_err();
        assert_eq!(err.error_code(), Some("INVALID_REQUEST"));
    }

    #[test]
    fn test_mock_backend_records_writes() {
        let mut mock = MockBackend::new();
        mock.respond(Method::Put, "/api/2.0/permissions/jobs/9", json!({}));

        let request = Request::new(Method::Put, "/api/2.0/permissions/jobs/9").with_body(json!({}));
        mock.execute(&request).unwrap();

        assert_eq!(mock.writes(), vec![request]);
    }

    #[test]
    fn test_session_refuses_after_cancel() {
        let mut mock = MockBackend::new();
        mock.respond(Method::Get, "/x", json!({}));
        let token = CancelToken::new();
        let session = Session::new(&mock, &token);

        assert!(session.send(&Request::get("/x")).is_ok());
        token.cancel();
        assert!(matches!(session.send(&Request::get("/x")), Err(Error::Cancelled)));
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_request_display() {
        let request = Request::get("/api/2.0/jobs/get").with_query("job_id", "123");
        assert_eq!(request.to_string(), "GET /api/2.0/jobs/get?job_id=123");
    }
}
