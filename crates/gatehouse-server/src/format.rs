//! Error-to-response formatting.
//!
//! Any error that was not claimed by a route's declared failure
//! descriptor ends up here: the dispatcher's own routing errors
//! (validation, not-found, method-not-allowed) and undeclared handler
//! failures. The [`DefaultFormatter`] maps them to the structured JSON
//! envelope; a user-supplied [`ErrorFormatter`] may replace it, and may
//! return a fully-formed wire response to take over serialization
//! entirely (e.g. for HTML or plain-text error bodies).

use http::request::Parts;
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

use gatehouse_core::{HandlerFailure, RouteError};

use crate::ServiceBody;

/// An error reaching the formatting stage.
#[derive(Debug)]
pub enum DispatchError {
    /// A routing-layer error: validation, not-found, method-not-allowed.
    Route(RouteError),
    /// A handler failure that no declared failure member claimed.
    Handler(HandlerFailure),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Route(error) => write!(f, "{error}"),
            Self::Handler(failure) => write!(f, "{failure}"),
        }
    }
}

/// The formatter's verdict.
pub enum FormattedError {
    /// A status/body/headers descriptor, serialized as JSON by the
    /// dispatcher.
    Descriptor {
        /// The response status.
        status: StatusCode,
        /// The JSON body.
        body: Value,
        /// Extra response headers.
        headers: HeaderMap,
    },
    /// A fully-formed wire response, passed through unmodified.
    Response(http::Response<ServiceBody>),
}

impl FormattedError {
    /// A descriptor with no extra headers.
    #[must_use]
    pub fn descriptor(status: StatusCode, body: Value) -> Self {
        Self::Descriptor {
            status,
            body,
            headers: HeaderMap::new(),
        }
    }
}

/// Maps unclaimed errors to wire responses.
///
/// Consulted only for errors that did not correlate to a declared
/// failure member; declared failures never reach a formatter.
pub trait ErrorFormatter: Send + Sync + 'static {
    /// Produces the wire shape for an error.
    fn format(&self, error: &DispatchError, request: &Parts) -> FormattedError;
}

/// The built-in formatter.
///
/// Routing errors become their structured envelope at 400/404/405,
/// with method-not-allowed additionally carrying an `Allow` header.
/// Everything else becomes a generic 500: the raw error is never
/// echoed to the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl ErrorFormatter for DefaultFormatter {
    fn format(&self, error: &DispatchError, _request: &Parts) -> FormattedError {
        match error {
            DispatchError::Route(route_error) => {
                let mut headers = HeaderMap::new();
                if let Some(allow) = route_error.allow_header() {
                    if let Ok(value) = http::header::HeaderValue::try_from(allow) {
                        headers.insert(http::header::ALLOW, value);
                    }
                }
                FormattedError::Descriptor {
                    status: route_error.status_code(),
                    body: route_error.to_envelope(),
                    headers,
                }
            }
            DispatchError::Handler(_) => FormattedError::descriptor(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "InternalServerError",
                    "message": "internal server error",
                }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn parts() -> Parts {
        let (parts, ()) = http::Request::builder()
            .method(Method::GET)
            .uri("/whatever")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn not_found_maps_to_404() {
        let error = DispatchError::Route(RouteError::not_found("/missing"));
        let FormattedError::Descriptor { status, body, headers } =
            DefaultFormatter.format(&error, &parts())
        else {
            panic!("expected descriptor");
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
        assert!(headers.get(http::header::ALLOW).is_none());
    }

    #[test]
    fn method_not_allowed_carries_allow_header() {
        let error = DispatchError::Route(RouteError::method_not_allowed(
            "/users",
            Method::DELETE,
            vec![Method::POST, Method::GET],
        ));
        let FormattedError::Descriptor { status, body, headers } =
            DefaultFormatter.format(&error, &parts())
        else {
            panic!("expected descriptor");
        };
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers.get(http::header::ALLOW).unwrap(), "get, post");
        assert_eq!(body["allowedMethods"], json!(["get", "post"]));
    }

    #[test]
    fn undeclared_errors_never_leak_details() {
        let error = DispatchError::Handler(HandlerFailure::other(anyhow::anyhow!(
            "secret database password is hunter2"
        )));
        let FormattedError::Descriptor { status, body, .. } =
            DefaultFormatter.format(&error, &parts())
        else {
            panic!("expected descriptor");
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let rendered = body.to_string();
        assert!(!rendered.contains("hunter2"));
        assert_eq!(body["error"], "InternalServerError");
    }
}
