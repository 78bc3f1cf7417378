//! Structured routing errors.
//!
//! [`RouteError`] is the dispatcher's own error taxonomy: no path
//! matched, path matched but the method didn't, or an input channel
//! failed validation. Each maps to a fixed status code and a
//! serializable JSON envelope. Handler-side failures travel as
//! [`HandlerFailure`] instead, so a declared failure payload is never
//! conflated with a routing defect.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// The input channel an issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputChannel {
    /// Path parameters.
    Path,
    /// Query string parameters.
    Query,
    /// HTTP headers.
    Header,
    /// Request body.
    Body,
}

impl std::fmt::Display for InputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// One concrete input-validation issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputIssue {
    /// The channel the invalid input came from.
    pub channel: InputChannel,
    /// The parameter or header name, when the issue is about one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// What was wrong.
    pub message: String,
}

impl InputIssue {
    /// Creates an issue for a named parameter.
    #[must_use]
    pub fn named(
        channel: InputChannel,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            name: Some(name.into()),
            message: message.into(),
        }
    }

    /// Creates an issue for a whole channel (e.g. a malformed body).
    #[must_use]
    pub fn channel(channel: InputChannel, message: impl Into<String>) -> Self {
        Self {
            channel,
            name: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InputIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} parameter '{}': {}", self.channel, name, self.message),
            None => write!(f, "{}: {}", self.channel, self.message),
        }
    }
}

/// A routing-layer error raised before or instead of the handler.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No route matched the request path.
    #[error("no route matched '{path}'")]
    NotFound {
        /// The request path.
        path: String,
    },

    /// A route matched the path but not the method.
    #[error("method '{method}' not allowed for '{path}'")]
    MethodNotAllowed {
        /// The request path.
        path: String,
        /// The request method.
        method: Method,
        /// Methods the matched route does implement, sorted.
        allowed: Vec<Method>,
    },

    /// One or more input channels failed validation.
    #[error("request validation failed: {}", first_issue(issues))]
    Validation {
        /// The issues, ordered by channel priority.
        issues: Vec<InputIssue>,
    },
}

fn first_issue(issues: &[InputIssue]) -> String {
    issues
        .first()
        .map_or_else(|| "no issues recorded".to_string(), ToString::to_string)
}

impl RouteError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a method-not-allowed error. The allowed list is sorted
    /// for a stable `Allow` header.
    #[must_use]
    pub fn method_not_allowed(
        path: impl Into<String>,
        method: Method,
        mut allowed: Vec<Method>,
    ) -> Self {
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Self::MethodNotAllowed {
            path: path.into(),
            method,
            allowed,
        }
    }

    /// Creates a validation error from channel issues.
    #[must_use]
    pub fn validation(issues: Vec<InputIssue>) -> Self {
        Self::Validation { issues }
    }

    /// Returns the machine-readable kind used in the wire envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::MethodNotAllowed { .. } => "MethodNotAllowed",
            Self::Validation { .. } => "ValidationError",
        }
    }

    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Renders the `Allow` header value for method-not-allowed errors:
    /// lowercase method names, comma-space-joined (`"get, post"`).
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        match self {
            Self::MethodNotAllowed { allowed, .. } => Some(
                allowed
                    .iter()
                    .map(|m| m.as_str().to_ascii_lowercase())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    }

    /// Serializes the `{ "error": <kind>, "message": ..., ...extra }`
    /// wire envelope.
    #[must_use]
    pub fn to_envelope(&self) -> Value {
        let mut envelope = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            Self::MethodNotAllowed { allowed, .. } => {
                let methods: Vec<String> = allowed
                    .iter()
                    .map(|m| m.as_str().to_ascii_lowercase())
                    .collect();
                envelope["allowedMethods"] = json!(methods);
            }
            Self::Validation { issues } => {
                envelope["issues"] = serde_json::to_value(issues).unwrap_or(Value::Null);
            }
            Self::NotFound { .. } => {}
        }
        envelope
    }
}

/// A failure produced by a handler.
///
/// Declared failures carry the discriminant tag of the failure shape
/// they claim plus the JSON payload to serialize; the dispatcher
/// correlates the tag against the route's declared failure descriptor
/// and picks the member's status. Everything else is an undeclared
/// error and ends up at the error formatter (500 by default, details
/// never echoed to the client).
#[derive(Debug)]
pub enum HandlerFailure {
    /// A failure matching a declared failure shape.
    Declared {
        /// The discriminant tag of the declared shape.
        tag: String,
        /// The payload serialized as the response body.
        body: Value,
    },
    /// Any other error.
    Other(anyhow::Error),
}

impl HandlerFailure {
    /// Creates a declared failure.
    #[must_use]
    pub fn declared(tag: impl Into<String>, body: Value) -> Self {
        Self::Declared {
            tag: tag.into(),
            body,
        }
    }

    /// Creates an undeclared failure from any error.
    #[must_use]
    pub fn other(error: impl Into<anyhow::Error>) -> Self {
        Self::Other(error.into())
    }

    /// Returns the declared tag, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Declared { tag, .. } => Some(tag),
            Self::Other(_) => None,
        }
    }
}

impl std::fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declared { tag, .. } => write!(f, "declared failure '{tag}'"),
            Self::Other(error) => write!(f, "{error}"),
        }
    }
}

impl<E> From<E> for HandlerFailure
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::Other(anyhow::Error::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_envelope() {
        let error = RouteError::not_found("/unknown");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.kind(), "NotFound");
        assert!(error.allow_header().is_none());

        let envelope = error.to_envelope();
        assert_eq!(envelope["error"], "NotFound");
        assert!(envelope["message"].as_str().unwrap().contains("/unknown"));
        assert!(envelope.get("allowedMethods").is_none());
    }

    #[test]
    fn method_not_allowed_sorts_and_formats_allow() {
        let error = RouteError::method_not_allowed(
            "/users",
            Method::DELETE,
            vec![Method::POST, Method::GET],
        );

        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error.allow_header().as_deref(), Some("get, post"));

        let envelope = error.to_envelope();
        assert_eq!(envelope["error"], "MethodNotAllowed");
        assert_eq!(envelope["allowedMethods"], json!(["get", "post"]));
    }

    #[test]
    fn validation_envelope_carries_issues() {
        let error = RouteError::validation(vec![
            InputIssue::named(InputChannel::Path, "id", "expected integer, got string"),
            InputIssue::channel(InputChannel::Body, "body is not valid JSON"),
        ]);

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("path parameter 'id'"));

        let envelope = error.to_envelope();
        assert_eq!(envelope["error"], "ValidationError");
        let issues = envelope["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0]["channel"], "path");
        assert_eq!(issues[0]["name"], "id");
        assert_eq!(issues[1]["channel"], "body");
        assert!(issues[1].get("name").is_none());
    }

    #[test]
    fn handler_failure_tags() {
        let declared = HandlerFailure::declared("NoteNotFound", json!({"id": "n1"}));
        assert_eq!(declared.tag(), Some("NoteNotFound"));

        let other = HandlerFailure::other(anyhow::anyhow!("boom"));
        assert_eq!(other.tag(), None);
        assert_eq!(other.to_string(), "boom");
    }

    #[test]
    fn handler_failure_from_std_error() {
        fn fails() -> Result<(), HandlerFailure> {
            Err(std::io::Error::other("disk on fire"))?;
            Ok(())
        }
        let failure = fails().unwrap_err();
        assert!(matches!(failure, HandlerFailure::Other(_)));
    }

    #[test]
    fn input_channel_display() {
        assert_eq!(InputChannel::Path.to_string(), "path");
        assert_eq!(InputChannel::Query.to_string(), "query");
        assert_eq!(InputChannel::Header.to_string(), "header");
        assert_eq!(InputChannel::Body.to_string(), "body");
    }
}
