//! Error types for the secmgr client.
//!
//! This module defines `ApiError`, the unified error type returned by every
//! client operation.
//!
//! # Security
//!
//! Error messages built from server responses are sanitized so the session
//! token and the login password never leak into logs or error output. Use
//! `sanitize_message()` when constructing messages from external sources.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Unified error type for all secmgr operations.
///
/// Transport and HTTP failures are propagated unchanged; nothing in the
/// client retries or swallows them.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status} {reason}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: StatusCode,
        /// Reason phrase for the status code.
        reason: String,
        /// The response body, sanitized and truncated.
        body: String,
    },

    /// Request exceeded its caller-supplied timeout.
    #[error("request timed out after {duration:?}: {operation}")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// Login was rejected or returned no token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// JSON serialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A response body did not match the expected wire shape.
    #[error("failed to decode {context}: {source}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// The underlying decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A response decoded but was missing data the client relies on.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Input validation failed before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// No workflow with the requested name exists in the domain.
    #[error("workflow {name:?} not found in domain {domain_id}")]
    WorkflowNotFound {
        /// The workflow name that was looked up.
        name: String,
        /// The domain that was searched.
        domain_id: String,
    },

    /// The ticket has no open task matching its current stage.
    #[error("ticket {ticket_id} has no open task for stage {status:?}")]
    StageTaskNotFound {
        /// The ticket that was fetched.
        ticket_id: String,
        /// The ticket's current stage name.
        status: String,
    },

    /// An endpoint template was filled with the wrong number of arguments.
    #[error("endpoint {endpoint} expects {expected} arguments, got {got}")]
    Template {
        /// Name of the endpoint.
        endpoint: &'static str,
        /// Number of placeholders in the template.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// Some items of a multi-step operation failed.
    #[error("{failed} of {total} items failed")]
    PartialFailure {
        /// Number of failed items.
        failed: usize,
        /// Number of items processed.
        total: usize,
    },

    /// An import row was not valid CSV.
    #[error("malformed CSV row: {0}")]
    Csv(#[from] csv::Error),
}

impl ApiError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        ApiError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ApiError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Creates a decode error with context.
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        ApiError::Decode {
            context: context.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        ApiError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Returns true if the server rejected the session credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
            || matches!(
                self.status(),
                Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
            )
    }

    /// Sanitizes an error message to remove any occurrence of a secret.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to sanitize
    /// * `secret` - The token or password to strip from the message
    ///
    /// # Returns
    ///
    /// The message with any occurrence of the secret replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}
