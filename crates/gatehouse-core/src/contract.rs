//! The declarative contract.
//!
//! A [`Contract`] maps path patterns (with `{name}` placeholders) to
//! per-method [`RouteDefinition`]s. It is built once with
//! [`ContractBuilder`], immutable for the lifetime of a service, and
//! consumed both by the route table compiler and by the OpenAPI
//! generator. Declaration order is preserved: when two patterns could
//! match the same path, the first declared wins.
//!
//! # Example
//!
//! ```
//! use gatehouse_core::contract::{Contract, RouteDefinition};
//! use gatehouse_core::response::ResponseSchema;
//! use gatehouse_core::schema::value;
//! use http::Method;
//!
//! let contract = Contract::builder("user-service")
//!     .version("1.0.0")
//!     .route(
//!         "/users/{userId}",
//!         Method::GET,
//!         RouteDefinition::builder(ResponseSchema::new(value::object(vec![
//!             ("id", value::string().required()),
//!             ("name", value::string().required()),
//!         ])))
//!         .path_param("userId", value::string())
//!         .build(),
//!     )
//!     .build();
//!
//! assert_eq!(contract.paths().count(), 1);
//! ```

use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;

use crate::response::{BodySchema, ResponseDescriptor};
use crate::schema::{IntoSchemaRef, SchemaRef};

/// The method → definition map for one path pattern.
pub type MethodMap = IndexMap<Method, Arc<RouteDefinition>>;

/// The full declarative contract of a service.
#[derive(Debug, Clone)]
pub struct Contract {
    name: String,
    version: String,
    paths: IndexMap<String, MethodMap>,
}

impl Contract {
    /// Creates a new contract builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder::new(name)
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the contract version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Iterates path patterns with their method maps, in declaration
    /// order.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &MethodMap)> {
        self.paths.iter().map(|(p, m)| (p.as_str(), m))
    }

    /// Looks up the definition for a (pattern, method) pair.
    #[must_use]
    pub fn definition(&self, pattern: &str, method: &Method) -> Option<&Arc<RouteDefinition>> {
        self.paths.get(pattern)?.get(method)
    }

    /// Returns the number of declared (pattern, method) operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(IndexMap::len).sum()
    }
}

/// Builder for [`Contract`].
#[derive(Debug, Default)]
pub struct ContractBuilder {
    name: String,
    version: String,
    paths: IndexMap<String, MethodMap>,
}

impl ContractBuilder {
    /// Creates a builder for a named service.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.0.0".to_string(),
            paths: IndexMap::new(),
        }
    }

    /// Sets the contract version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Declares a route. Re-declaring the same (pattern, method) pair
    /// replaces the earlier definition; the pattern keeps its original
    /// position in declaration order.
    #[must_use]
    pub fn route(
        mut self,
        pattern: impl Into<String>,
        method: Method,
        definition: RouteDefinition,
    ) -> Self {
        self.paths
            .entry(pattern.into())
            .or_default()
            .insert(method, Arc::new(definition));
        self
    }

    /// Builds the contract.
    #[must_use]
    pub fn build(self) -> Contract {
        Contract {
            name: self.name,
            version: self.version,
            paths: self.paths,
        }
    }
}

/// One method's declared input and output shapes for one path.
#[derive(Clone)]
pub struct RouteDefinition {
    description: Option<String>,
    path_params: IndexMap<String, SchemaRef>,
    query_params: IndexMap<String, SchemaRef>,
    header_params: IndexMap<String, SchemaRef>,
    body: Option<BodySchema>,
    success: ResponseDescriptor,
    failure: Option<ResponseDescriptor>,
    decode_path: bool,
}

impl RouteDefinition {
    /// Creates a builder; the success descriptor is the one mandatory
    /// part of a definition.
    #[must_use]
    pub fn builder(success: impl Into<ResponseDescriptor>) -> RouteDefinitionBuilder {
        RouteDefinitionBuilder {
            description: None,
            path_params: IndexMap::new(),
            query_params: IndexMap::new(),
            header_params: IndexMap::new(),
            body: None,
            success: success.into(),
            failure: None,
            decode_path: true,
        }
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared path-parameter schemas.
    ///
    /// A placeholder with no entry here passes through as a raw string.
    #[must_use]
    pub fn path_params(&self) -> &IndexMap<String, SchemaRef> {
        &self.path_params
    }

    /// Returns the declared query-parameter schemas.
    #[must_use]
    pub fn query_params(&self) -> &IndexMap<String, SchemaRef> {
        &self.query_params
    }

    /// Returns the declared header schemas.
    #[must_use]
    pub fn header_params(&self) -> &IndexMap<String, SchemaRef> {
        &self.header_params
    }

    /// Returns the declared body schema, if any.
    #[must_use]
    pub fn body(&self) -> Option<&BodySchema> {
        self.body.as_ref()
    }

    /// Returns the success descriptor.
    #[must_use]
    pub fn success(&self) -> &ResponseDescriptor {
        &self.success
    }

    /// Returns the failure descriptor, if declared.
    #[must_use]
    pub fn failure(&self) -> Option<&ResponseDescriptor> {
        self.failure.as_ref()
    }

    /// Returns whether captured path parameters are percent-decoded
    /// before validation (default `true`).
    #[must_use]
    pub fn decode_path(&self) -> bool {
        self.decode_path
    }
}

impl std::fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("description", &self.description)
            .field("path_params", &self.path_params.keys().collect::<Vec<_>>())
            .field("query_params", &self.query_params.keys().collect::<Vec<_>>())
            .field(
                "header_params",
                &self.header_params.keys().collect::<Vec<_>>(),
            )
            .field("body", &self.body)
            .field("success", &self.success)
            .field("failure", &self.failure)
            .field("decode_path", &self.decode_path)
            .finish()
    }
}

/// Builder for [`RouteDefinition`].
pub struct RouteDefinitionBuilder {
    description: Option<String>,
    path_params: IndexMap<String, SchemaRef>,
    query_params: IndexMap<String, SchemaRef>,
    header_params: IndexMap<String, SchemaRef>,
    body: Option<BodySchema>,
    success: ResponseDescriptor,
    failure: Option<ResponseDescriptor>,
    decode_path: bool,
}

impl RouteDefinitionBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a path-parameter schema.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, schema: impl IntoSchemaRef) -> Self {
        self.path_params.insert(name.into(), schema.into_schema_ref());
        self
    }

    /// Declares a query-parameter schema.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, schema: impl IntoSchemaRef) -> Self {
        self.query_params
            .insert(name.into(), schema.into_schema_ref());
        self
    }

    /// Declares a header schema. Lookup at decode time is
    /// case-insensitive.
    #[must_use]
    pub fn header_param(mut self, name: impl Into<String>, schema: impl IntoSchemaRef) -> Self {
        self.header_params
            .insert(name.into(), schema.into_schema_ref());
        self
    }

    /// Declares a validated JSON request body.
    #[must_use]
    pub fn body(mut self, schema: impl IntoSchemaRef) -> Self {
        self.body = Some(BodySchema::Validated(schema.into_schema_ref()));
        self
    }

    /// Declares the request body as an opaque byte stream.
    #[must_use]
    pub fn stream_body(mut self) -> Self {
        self.body = Some(BodySchema::Stream);
        self
    }

    /// Declares the request body as raw, unvalidated text.
    #[must_use]
    pub fn raw_body(mut self) -> Self {
        self.body = Some(BodySchema::Raw);
        self
    }

    /// Declares the failure descriptor.
    #[must_use]
    pub fn failure(mut self, failure: impl Into<ResponseDescriptor>) -> Self {
        self.failure = Some(failure.into());
        self
    }

    /// Sets the path-parameter percent-decoding policy.
    #[must_use]
    pub fn decode_path(mut self, decode: bool) -> Self {
        self.decode_path = decode;
        self
    }

    /// Builds the definition.
    #[must_use]
    pub fn build(self) -> RouteDefinition {
        RouteDefinition {
            description: self.description,
            path_params: self.path_params,
            query_params: self.query_params,
            header_params: self.header_params,
            body: self.body,
            success: self.success,
            failure: self.failure,
            decode_path: self.decode_path,
        }
    }
}
