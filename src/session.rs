//! Authenticated session with the Security Manager server.
//!
//! A `Session` is created by logging in once and is then used for every
//! request a client makes. Each request carries the auth token obtained at
//! login. Content type, `Connection: close` and timeouts are set per
//! request; the session itself holds no mutable header state.
//!
//! There is no retry logic: any transport error, timeout or non-2xx status
//! is returned to the caller as-is.
//!
//! # Security
//!
//! Neither the password nor the token is ever logged. Error bodies are
//! sanitized before they are stored in an `ApiError`.

use std::fmt::Display;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONNECTION, CONTENT_TYPE};
use reqwest::{multipart, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::endpoints::Endpoint;
use crate::error::ApiError;

/// Header carrying the session token.
pub const AUTH_TOKEN_HEADER: &str = "X-FM-Auth-Token";

const JSON_CONTENT: &str = "application/json";

/// Maximum length for HTTP error response bodies kept in errors.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON body with `application/json` content type.
    Json(serde_json::Value),
    /// Plain text body with `text/plain` content type.
    Text(String),
    /// Multipart form upload.
    Multipart(multipart::Form),
}

/// A single request to be executed on a `Session`.
///
/// # Example
///
/// ```ignore
/// let request = ApiRequest::get(url)
///     .query("pageSize", 100)
///     .timeout(Some(Duration::from_secs(60)));
/// let response = session.execute(request).await?;
/// ```
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
    close_connection: bool,
}

impl ApiRequest {
    /// Creates a request with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            close_connection: false,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Appends a query parameter. Repeated keys are sent repeatedly.
    pub fn query(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends several query parameters.
    pub fn query_pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Display,
    {
        for (key, value) in pairs {
            self.query.push((key.into(), value.to_string()));
        }
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sets a plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    /// Sets a multipart form body.
    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Sets an optional per-request timeout.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asks the server to close the connection after this request.
    pub fn close_connection(mut self) -> Self {
        self.close_connection = true;
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason phrase for the status code.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Returns the raw body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the response and returns the raw body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON, naming what was expected in the error.
    pub fn decode<T: DeserializeOwned>(&self, context: &str) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::decode(context, e))
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Authenticated channel to one server.
///
/// Owned by exactly one client. Dropping it or calling `logout` ends its use.
pub struct Session {
    /// The underlying HTTP client.
    http: Client,

    /// Normalized base URL (no trailing slash).
    host: String,

    /// Token sent with every request.
    /// SECURITY: Never log this value!
    token: String,
}

impl Session {
    /// Logs in with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Authentication` if the server rejects the
    /// credentials or does not return a token, and `ApiError::Http` on
    /// transport failure.
    pub async fn login(config: &Config) -> Result<Self, ApiError> {
        let http = Self::build_http(config)?;
        let url = Endpoint::Login.url(&config.host, &[])?;

        tracing::debug!(host = %config.host, username = %config.username, "Logging in");

        let payload = serde_json::json!({
            "username": config.username,
            "password": config.password(),
        });

        let response = http
            .post(&url)
            .header(ACCEPT, JSON_CONTENT)
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication(format!(
                "server rejected credentials for user {:?} ({})",
                config.username, status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = ApiError::sanitize_message(&body, config.password());
            return Err(ApiError::HttpStatus {
                status,
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body: truncate_body(body),
            });
        }

        let body = response.bytes().await.map_err(ApiError::Http)?;
        let login: LoginResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::decode("login response", e))?;

        let token = login
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Authentication("login response carried no token".into()))?;

        tracing::info!(host = %config.host, "Session established");

        Ok(Self {
            http,
            host: config.host.clone(),
            token,
        })
    }

    /// Wraps an already issued token without logging in.
    pub fn with_token(config: &Config, token: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            http: Self::build_http(config)?,
            host: config.host.clone(),
            token: token.into(),
        })
    }

    fn build_http(config: &Config) -> Result<Client, ApiError> {
        if !config.verify_tls && !config.suppress_tls_warning {
            tracing::warn!(
                host = %config.host,
                "TLS certificate verification is disabled for this session"
            );
        }

        Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(ApiError::HttpClient)
    }

    /// Returns the normalized base URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Builds the full URL for an endpoint on this session's host.
    pub fn url(&self, endpoint: Endpoint, args: &[&dyn Display]) -> Result<String, ApiError> {
        endpoint.url(&self.host, args)
    }

    /// Executes a request with the session token attached.
    ///
    /// # Errors
    ///
    /// - `ApiError::Timeout` if a per-request timeout elapsed
    /// - `ApiError::Http` on any other transport failure
    /// - `ApiError::HttpStatus` on a non-2xx response
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest {
            method,
            url,
            query,
            body,
            timeout,
            close_connection,
        } = request;

        tracing::debug!(method = %method, url = %url, "Making API request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .header(ACCEPT, JSON_CONTENT);

        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        if close_connection {
            req = req.header(CONNECTION, "close");
        }

        req = match body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(&value),
            RequestBody::Text(text) => req.header(CONTENT_TYPE, "text/plain").body(text),
            RequestBody::Multipart(form) => req.multipart(form),
        };

        let response = req.send().await.map_err(|e| match timeout {
            Some(duration) if e.is_timeout() => {
                ApiError::timeout(duration, format!("{} {}", method, url))
            }
            _ => ApiError::Http(e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let body = response.bytes().await.map_err(ApiError::Http)?;

        tracing::trace!(status = %status, len = body.len(), "API response");

        Ok(ApiResponse::new(status, body.to_vec()))
    }

    /// Ends the session on the server and closes the connection.
    pub async fn logout(self) -> Result<ApiResponse, ApiError> {
        let url = self.url(Endpoint::Logout, &[])?;
        let response = self
            .execute(ApiRequest::post(url).close_connection())
            .await?;
        tracing::info!(host = %self.host, "Session closed");
        Ok(response)
    }

    /// Converts a non-2xx response into an error with a sanitized body.
    async fn handle_http_error(&self, status: StatusCode, response: reqwest::Response) -> ApiError {
        let body = response.text().await.unwrap_or_default();
        let body = ApiError::sanitize_message(&body, &self.token);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = %status, "Server rejected session token");
        }

        ApiError::HttpStatus {
            status,
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body: truncate_body(body),
        }
    }
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body;
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
