//! Per-request context.
//!
//! A [`RequestContext`] is built by the dispatcher after a request has
//! been matched and its inputs decoded, and handed to the handler. It
//! carries the decoded path/query/header/body values, the route
//! definition they were decoded against, and `respond` helpers that
//! stamp status and headers per the route's success descriptor.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use uuid::Uuid;

use crate::body::ByteStream;
use crate::contract::RouteDefinition;
use crate::response::{ResponseDescriptor, TypedResponse};

/// A unique identifier for each request, using UUID v7.
///
/// Time-ordered, which makes it suitable for request tracking and log
/// correlation; generated per request rather than drawn from any
/// process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID, e.g. one parsed from a header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared slot holding an unconsumed request body stream.
///
/// The dispatcher keeps a clone; if the request fails while the stream
/// is still in the slot, the stream is canceled. A handler takes
/// ownership through [`RequestContext::take_stream`].
pub type StreamSlot = Arc<Mutex<Option<ByteStream>>>;

/// The decoded per-request state handed to handlers.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    definition: Arc<RouteDefinition>,
    path: Value,
    query: Value,
    headers: Value,
    body: Option<Value>,
    stream: Option<StreamSlot>,
}

impl RequestContext {
    /// Assembles a context from decoded inputs.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        definition: Arc<RouteDefinition>,
        path: Value,
        query: Value,
        headers: Value,
        body: Option<Value>,
        stream: Option<ByteStream>,
    ) -> Self {
        Self {
            request_id,
            definition,
            path,
            query,
            headers,
            body,
            stream: stream.map(|s| Arc::new(Mutex::new(Some(s)))),
        }
    }

    /// Creates a context with no decoded inputs, for tests.
    #[must_use]
    pub fn mock(definition: Arc<RouteDefinition>) -> Self {
        Self::new(
            RequestId::new(),
            definition,
            Value::Object(serde_json::Map::new()),
            Value::Object(serde_json::Map::new()),
            Value::Object(serde_json::Map::new()),
            None,
            None,
        )
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the route definition this request was decoded against.
    #[must_use]
    pub fn definition(&self) -> &Arc<RouteDefinition> {
        &self.definition
    }

    /// Returns the decoded path parameters as a JSON object.
    #[must_use]
    pub fn path(&self) -> &Value {
        &self.path
    }

    /// Returns one decoded path parameter.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&Value> {
        self.path.get(name)
    }

    /// Returns the decoded query parameters as a JSON object.
    #[must_use]
    pub fn query(&self) -> &Value {
        &self.query
    }

    /// Returns one decoded query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Returns the decoded headers as a JSON object, keyed by the
    /// declared (lowercased) header names.
    #[must_use]
    pub fn headers(&self) -> &Value {
        &self.headers
    }

    /// Returns the decoded body: the validated JSON value, or the raw
    /// text as a JSON string for raw bodies. `None` when the route
    /// declares no body, the body was empty, or the body is a stream.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Takes ownership of the request body stream, if this route
    /// declared a streaming body and it has not been taken yet.
    ///
    /// Once taken, full consumption is the handler's responsibility;
    /// the dispatcher will no longer cancel it on failure.
    #[must_use]
    pub fn take_stream(&self) -> Option<ByteStream> {
        let slot = self.stream.as_ref()?;
        slot.lock().ok()?.take()
    }

    /// Returns the shared stream slot, used by the dispatcher for
    /// cancellation-on-failure.
    #[must_use]
    pub fn stream_slot(&self) -> Option<StreamSlot> {
        self.stream.clone()
    }

    /// Returns the route's success descriptor.
    #[must_use]
    pub fn success(&self) -> &ResponseDescriptor {
        self.definition.success()
    }

    /// Builds a JSON response at the success descriptor's default
    /// status. Chain [`TypedResponse::with_status`] to pick another
    /// declared status.
    #[must_use]
    pub fn respond(&self, body: Value) -> TypedResponse {
        TypedResponse::json(body)
    }

    /// Builds an empty response at the default success status.
    #[must_use]
    pub fn respond_empty(&self) -> TypedResponse {
        TypedResponse::empty()
    }

    /// Builds a streaming response at the default success status.
    #[must_use]
    pub fn respond_stream(&self, stream: ByteStream) -> TypedResponse {
        TypedResponse::stream(stream)
    }
}
