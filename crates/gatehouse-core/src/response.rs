//! Response descriptors and typed responses.
//!
//! A [`ResponseDescriptor`] declares what a route may legitimately send
//! back for one logical outcome (success or failure): either a single
//! (status, body schema, header schemas) triple, or an ordered union of
//! them when one endpoint must express several (status, shape) pairs —
//! "201 on create, 200 on idempotent no-op", or "404 vs 409 for two
//! distinct failure modes". The first union member is the default used
//! when a handler returns a bare value.
//!
//! [`TypedResponse`] is the normalized handler outcome consumed by the
//! dispatcher.

use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::body::ByteStream;
use crate::schema::{IntoSchemaRef, Schema, SchemaRef};

/// How a body channel is interpreted.
///
/// An explicit tagged variant rather than a sentinel schema value, so
/// the decoder and serializer dispatch on the variant instead of
/// probing object shape.
#[derive(Clone)]
pub enum BodySchema {
    /// JSON body validated against a schema.
    Validated(SchemaRef),
    /// Opaque byte stream; no JSON parsing or serialization.
    Stream,
    /// Raw text passed through without JSON parsing or validation.
    Raw,
}

impl BodySchema {
    /// Creates a validated JSON body schema.
    #[must_use]
    pub fn validated(schema: impl IntoSchemaRef) -> Self {
        Self::Validated(schema.into_schema_ref())
    }

    /// Returns the inner schema for validated bodies.
    #[must_use]
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            Self::Validated(schema) => Some(schema),
            Self::Stream | Self::Raw => None,
        }
    }

    /// Returns whether this is the stream marker.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream)
    }
}

impl std::fmt::Debug for BodySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validated(_) => f.write_str("Validated(..)"),
            Self::Stream => f.write_str("Stream"),
            Self::Raw => f.write_str("Raw"),
        }
    }
}

/// One declared (status, body schema, header schemas) triple.
#[derive(Clone)]
pub struct ResponseSchema {
    body: Option<BodySchema>,
    status: StatusCode,
    headers: IndexMap<String, SchemaRef>,
}

impl std::fmt::Debug for ResponseSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSchema")
            .field("body", &self.body)
            .field("status", &self.status)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResponseSchema {
    /// Declares a validated JSON body at status 200.
    #[must_use]
    pub fn new(body: impl IntoSchemaRef) -> Self {
        Self {
            body: Some(BodySchema::Validated(body.into_schema_ref())),
            status: StatusCode::OK,
            headers: IndexMap::new(),
        }
    }

    /// Declares a streaming body at status 200.
    #[must_use]
    pub fn stream() -> Self {
        Self {
            body: Some(BodySchema::Stream),
            status: StatusCode::OK,
            headers: IndexMap::new(),
        }
    }

    /// Declares an empty body at status 200.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            body: None,
            status: StatusCode::OK,
            headers: IndexMap::new(),
        }
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Declares a response header schema.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, schema: impl IntoSchemaRef) -> Self {
        self.headers.insert(name.into(), schema.into_schema_ref());
        self
    }

    /// Returns the declared body schema, if any.
    #[must_use]
    pub fn body(&self) -> Option<&BodySchema> {
        self.body.as_ref()
    }

    /// Returns the declared status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the declared header schemas.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, SchemaRef> {
        &self.headers
    }

    /// Returns this member's failure-correlation tag, if its body is a
    /// tagged validated schema.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.body.as_ref().and_then(BodySchema::schema)?.tag()
    }

    fn document_body(&self) -> Value {
        match &self.body {
            Some(BodySchema::Validated(schema)) => schema.to_json_schema(),
            Some(BodySchema::Stream) => json!({"type": "string", "format": "binary"}),
            Some(BodySchema::Raw) => json!({"type": "string"}),
            None => json!({"type": "null"}),
        }
    }
}

/// A single response shape or an ordered union of them.
#[derive(Clone, Debug)]
pub enum ResponseDescriptor {
    /// Exactly one declared (status, shape) pair.
    Single(ResponseSchema),
    /// An ordered, possibly duplicated list of (status, shape) pairs.
    /// The first member is the default.
    Union(Vec<ResponseSchema>),
}

impl ResponseDescriptor {
    /// Wraps a single response schema.
    #[must_use]
    pub fn single(member: ResponseSchema) -> Self {
        Self::Single(member)
    }

    /// Builds a union from an ordered member list. Duplicates are kept.
    #[must_use]
    pub fn union(members: Vec<ResponseSchema>) -> Self {
        Self::Union(members)
    }

    /// Returns the flattened member list (length 1 for a single).
    #[must_use]
    pub fn members(&self) -> &[ResponseSchema] {
        match self {
            Self::Single(member) => std::slice::from_ref(member),
            Self::Union(members) => members,
        }
    }

    /// Returns the declared status codes, in declaration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusCode> {
        self.members().iter().map(ResponseSchema::status).collect()
    }

    /// Returns the status used when a handler emits a bare value:
    /// the first member's status, or 200 for an empty union.
    #[must_use]
    pub fn default_status(&self) -> StatusCode {
        self.members()
            .first()
            .map_or(StatusCode::OK, ResponseSchema::status)
    }

    /// Returns whether the given status is one of the declared ones.
    #[must_use]
    pub fn allows_status(&self, status: StatusCode) -> bool {
        self.members().iter().any(|m| m.status() == status)
    }

    /// Renders the body shape for documentation: the sole member's
    /// schema, or an `anyOf` over all member shapes. Outbound bodies
    /// are not re-validated at runtime, so this is documentation only.
    #[must_use]
    pub fn document_body(&self) -> Value {
        match self.members() {
            [] => json!({"type": "null"}),
            [member] => member.document_body(),
            members => {
                let shapes: Vec<Value> = members.iter().map(ResponseSchema::document_body).collect();
                json!({"anyOf": shapes})
            }
        }
    }
}

impl From<ResponseSchema> for ResponseDescriptor {
    fn from(member: ResponseSchema) -> Self {
        Self::Single(member)
    }
}

/// The body of a normalized response.
#[derive(Debug)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// A JSON value, serialized with `Content-Type: application/json`
    /// unless a header overrides it.
    Json(Value),
    /// Raw text, written as-is.
    Text(String),
    /// A byte stream, written with
    /// `Content-Type: application/octet-stream` unless overridden.
    Stream(ByteStream),
}

/// The normalized success outcome of a handler.
///
/// A `None` status means "the success descriptor's default status";
/// an explicit status must be one of the declared ones.
#[derive(Debug)]
pub struct TypedResponse {
    body: ResponseBody,
    status: Option<StatusCode>,
    headers: HeaderMap,
}

impl TypedResponse {
    /// A JSON response at the route's default success status.
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self {
            body: ResponseBody::Json(body),
            status: None,
            headers: HeaderMap::new(),
        }
    }

    /// An empty response at the route's default success status.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            body: ResponseBody::Empty,
            status: None,
            headers: HeaderMap::new(),
        }
    }

    /// A raw text response at the route's default success status.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: ResponseBody::Text(body.into()),
            status: None,
            headers: HeaderMap::new(),
        }
    }

    /// A streaming response at the route's default success status.
    #[must_use]
    pub fn stream(stream: ByteStream) -> Self {
        Self {
            body: ResponseBody::Stream(stream),
            status: None,
            headers: HeaderMap::new(),
        }
    }

    /// Chooses an explicit status, which the dispatcher checks against
    /// the declared success statuses.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a response header.
    ///
    /// Invalid names or values are ignored rather than panicking; the
    /// declared header schemas are the documentation-facing source of
    /// truth.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Returns the explicit status, if one was chosen.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decomposes into (body, status, headers).
    #[must_use]
    pub fn into_parts(self) -> (ResponseBody, Option<StatusCode>, HeaderMap) {
        (self.body, self.status, self.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::value;

    #[test]
    fn single_descriptor_defaults() {
        let descriptor = ResponseDescriptor::single(ResponseSchema::new(value::string()));

        assert_eq!(descriptor.members().len(), 1);
        assert_eq!(descriptor.default_status(), StatusCode::OK);
        assert_eq!(descriptor.statuses(), vec![StatusCode::OK]);
        assert!(descriptor.allows_status(StatusCode::OK));
        assert!(!descriptor.allows_status(StatusCode::CREATED));
    }

    #[test]
    fn union_first_member_is_default() {
        let descriptor = ResponseDescriptor::union(vec![
            ResponseSchema::new(value::any()).with_status(StatusCode::CREATED),
            ResponseSchema::new(value::any()).with_status(StatusCode::OK),
        ]);

        assert_eq!(descriptor.default_status(), StatusCode::CREATED);
        assert_eq!(
            descriptor.statuses(),
            vec![StatusCode::CREATED, StatusCode::OK]
        );
        assert!(descriptor.allows_status(StatusCode::OK));
        assert!(!descriptor.allows_status(StatusCode::ACCEPTED));
    }

    #[test]
    fn empty_union_defaults_to_ok() {
        let descriptor = ResponseDescriptor::union(Vec::new());
        assert_eq!(descriptor.default_status(), StatusCode::OK);
        assert_eq!(descriptor.document_body()["type"], "null");
    }

    #[test]
    fn union_keeps_duplicates() {
        let descriptor = ResponseDescriptor::union(vec![
            ResponseSchema::new(value::string()),
            ResponseSchema::new(value::string()),
        ]);
        assert_eq!(descriptor.members().len(), 2);
    }

    #[test]
    fn document_body_any_of_for_unions() {
        let descriptor = ResponseDescriptor::union(vec![
            ResponseSchema::new(value::string()),
            ResponseSchema::new(value::integer()).with_status(StatusCode::CREATED),
        ]);

        let doc = descriptor.document_body();
        let members = doc["anyOf"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0]["type"], "string");
        assert_eq!(members[1]["type"], "integer");
    }

    #[test]
    fn stream_member_documents_as_binary() {
        let descriptor = ResponseDescriptor::single(ResponseSchema::stream());
        let doc = descriptor.document_body();
        assert_eq!(doc["format"], "binary");
    }

    #[test]
    fn member_tag_comes_from_tagged_body() {
        let member = ResponseSchema::new(value::tagged(
            "OutOfStock",
            vec![("sku", value::string().required())],
        ))
        .with_status(StatusCode::CONFLICT);

        assert_eq!(member.tag(), Some("OutOfStock"));
        assert_eq!(
            ResponseSchema::new(value::object(vec![("sku", value::string())])).tag(),
            None
        );
        assert_eq!(ResponseSchema::stream().tag(), None);
    }

    #[test]
    fn typed_response_builders() {
        let response = TypedResponse::json(serde_json::json!({"ok": true}))
            .with_status(StatusCode::CREATED)
            .with_header("location", "/things/1");

        assert_eq!(response.status(), Some(StatusCode::CREATED));
        assert_eq!(response.headers().get("location").unwrap(), "/things/1");
        assert!(matches!(response.body(), ResponseBody::Json(_)));

        let bare = TypedResponse::empty();
        assert_eq!(bare.status(), None);
        assert!(bare.headers().is_empty());
    }

    #[test]
    fn invalid_header_names_are_ignored() {
        let response = TypedResponse::empty().with_header("bad header\n", "x");
        assert!(response.headers().is_empty());
    }
}
