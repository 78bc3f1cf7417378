//! OpenAPI documentation for Gatehouse contracts.
//!
//! The generator consumes only contract metadata — route patterns,
//! per-channel schemas (rendered through the validation engine's own
//! JSON Schema output), and the flattened success/failure response
//! descriptors — and emits a static OpenAPI 3.1 document.

pub mod generator;
pub mod openapi;

pub use generator::OpenApiGenerator;
pub use openapi::{
    Header, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem, RequestBody,
    Response, Server,
};
