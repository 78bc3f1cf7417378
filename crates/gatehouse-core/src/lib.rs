//! Core types for the Gatehouse contract-first routing layer.
//!
//! This crate defines the declarative model everything else consumes:
//! the [`contract::Contract`] (paths → methods → route definitions),
//! the [`response::ResponseDescriptor`] algebra describing allowed
//! (status, shape) pairs, the [`schema::Schema`] interface to an
//! external validation engine, the structured error taxonomy, and the
//! per-request [`context::RequestContext`].

pub mod body;
pub mod context;
pub mod contract;
pub mod error;
pub mod response;
pub mod schema;

pub use body::{BoxError, ByteStream, StreamHandle};
pub use context::{RequestContext, RequestId, StreamSlot};
pub use contract::{Contract, ContractBuilder, MethodMap, RouteDefinition, RouteDefinitionBuilder};
pub use error::{HandlerFailure, InputChannel, InputIssue, RouteError};
pub use response::{
    BodySchema, ResponseBody, ResponseDescriptor, ResponseSchema, TypedResponse,
};
pub use schema::{IntoSchemaRef, Schema, SchemaRef, SchemaViolation};
