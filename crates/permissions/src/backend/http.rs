//! Blocking HTTP backend for the workspace REST API.
//!
//! Authentication is limited to forwarding a bearer token; obtaining one is
//! left to the caller.

use crate::backend::{Backend, Method, Request};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Body, RequestBuilder};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("aclsync/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Workspace URL, e.g. `https://adb-123.azuredatabricks.net`.
    pub host: String,
    /// Bearer token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Create settings with the default timeout.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Error body returned by the workspace API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// Workspace API backend over `ureq`.
///
/// # Example
///
/// ```no_run
/// use permissions::backend::http::{HttpBackend, HttpConfig};
/// use permissions::backend::{Backend, Request};
///
/// let config = HttpConfig::new("https://example.cloud.databricks.com", "dapi...");
/// let backend = HttpBackend::new(&config)?;
/// let me = backend.execute(&Request::get("/api/2.0/preview/scim/v2/Me"))?;
/// println!("{}", me["userName"]);
/// # Ok::<(), permissions::Error>(())
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Normalized workspace URL without trailing slash.
    host: String,
    /// Value of the `Authorization` header.
    authorization: String,
}

impl HttpBackend {
    /// Create a backend for a workspace.
    ///
    /// # Errors
    ///
    /// Returns a validation error if host or token is empty.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(Error::invalid("host", "workspace host must be set"));
        }
        if config.token.trim().is_empty() {
            return Err(Error::invalid("token", "access token must be set"));
        }

        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            host: normalize_host(&config.host),
            authorization: format!("Bearer {}", config.token.trim()),
        })
    }

    /// The normalized workspace URL.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    fn without_body(
        &self,
        builder: RequestBuilder<WithoutBody>,
        request: &Request,
    ) -> Result<ureq::http::Response<Body>> {
        let mut builder = builder
            .header("Authorization", &self.authorization)
            .header("User-Agent", USER_AGENT);
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        Ok(builder.call()?)
    }

    fn with_body(
        &self,
        builder: RequestBuilder<WithBody>,
        request: &Request,
    ) -> Result<ureq::http::Response<Body>> {
        let mut builder = builder
            .header("Authorization", &self.authorization)
            .header("User-Agent", USER_AGENT);
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        let body = request
            .body
            .clone()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Ok(builder.send_json(&body)?)
    }
}

impl Backend for HttpBackend {
    fn execute(&self, request: &Request) -> Result<Value> {
        let url = format!("{}{}", self.host, request.path);
        let mut response = match request.method {
            Method::Get => self.without_body(self.agent.get(&url), request)?,
            Method::Delete => self.without_body(self.agent.delete(&url), request)?,
            Method::Put => self.with_body(self.agent.put(&url), request)?,
            Method::Patch => self.with_body(self.agent.patch(&url), request)?,
            Method::Post => self.with_body(self.agent.post(&url), request)?,
        };

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;

        if !(200..300).contains(&status) {
            return Err(api_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Add a scheme if missing and drop trailing slashes.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Build an API error from a non-success response body.
fn api_error(status: u16, text: &str) -> Error {
    let body: ApiErrorBody = serde_json::from_str(text).unwrap_or_default();
    let message = if body.message.is_empty() {
        if text.trim().is_empty() {
            format!("request failed with status {status}")
        } else {
            text.trim().to_string()
        }
    } else {
        body.message
    };
    Error::api(status, body.error_code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("example.com/"), "https://example.com");
        assert_eq!(normalize_host("http://localhost:8080"), "http://localhost:8080");
        assert_eq!(
            normalize_host(" https://adb-1.azuredatabricks.net// "),
            "https://adb-1.azuredatabricks.net"
        );
    }

    #[test]
    fn test_api_error_parses_body() {
        let err = api_error(
            404,
            r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "Cluster abc does not exist"}"#,
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Cluster abc does not exist");
    }

    #[test]
    fn test_api_error_falls_back_to_text() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert_eq!(err.error_code(), Some(""));

        let err = api_error(500, "");
        assert_eq!(err.to_string(), "request failed with status 500");
    }

    #[test]
    fn test_new_requires_host_and_token() {
        assert!(HttpBackend::new(&HttpConfig::new("", "t")).is_err());
        assert!(HttpBackend::new(&HttpConfig::new("example.com", " ")).is_err());

        let backend = HttpBackend::new(&HttpConfig::new("example.com", "t")).unwrap();
        assert_eq!(backend.host(), "https://example.com");
    }
}
