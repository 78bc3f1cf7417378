//! # Gatehouse
//!
//! **Contract-first HTTP routing for Rust**
//!
//! Gatehouse turns a declarative contract — per path and method, the
//! schemas of path/query/header/body inputs and of success/failure
//! outputs — into a working request pipeline:
//!
//! - **Route compilation** – `{name}` patterns become matchers with
//!   correct escaping and parameter extraction
//! - **Input validation** – every declared channel is decoded against
//!   its schema, with precise per-channel error reporting
//! - **Typed responses** – single statuses or declared status unions,
//!   with the default stamped for bare values
//! - **Failure correlation** – declared failure shapes map handler
//!   errors to their declared status codes; everything else hits a
//!   pluggable formatter that never leaks internals
//! - **OpenAPI** – the same contract metadata renders a static
//!   OpenAPI 3.1 document
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatehouse::prelude::*;
//! use http::Method;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let contract = Contract::builder("hello")
//!         .route(
//!             "/hello/{name}",
//!             Method::GET,
//!             RouteDefinition::builder(ResponseSchema::new(value::string()))
//!                 .path_param("name", value::string())
//!                 .build(),
//!         )
//!         .build();
//!
//!     let service = std::sync::Arc::new(
//!         ContractService::builder(contract)
//!             .value_handler("/hello/{name}", Method::GET, |ctx| async move {
//!                 Ok(json!(format!("hello, {}", ctx.path_param("name").unwrap())))
//!             })
//!             .build()?,
//!     );
//!
//!     serve(service, ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```

// Re-export core types
pub use gatehouse_core as core;

// Re-export router types
pub use gatehouse_router as router;

// Re-export extraction types
pub use gatehouse_extract as extract;

// Re-export server types
pub use gatehouse_server as server;

// Re-export documentation types
pub use gatehouse_docs as docs;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use gatehouse::prelude::*;
/// ```
pub mod prelude {
    pub use gatehouse_core::schema::{value, IntoSchemaRef, Schema, SchemaRef, SchemaViolation};
    pub use gatehouse_core::{
        BodySchema, ByteStream, Contract, HandlerFailure, RequestContext, RequestId,
        ResponseDescriptor, ResponseSchema, RouteDefinition, RouteError, StreamHandle,
        TypedResponse,
    };

    pub use gatehouse_router::{PathPattern, RouteResolution, RouteTable};

    pub use gatehouse_server::{
        serve, ContractService, DefaultFormatter, DispatchError, ErrorFormatter, FormattedError,
        HandlerRegistry, ResponsePolicy, ServerConfig,
    };

    pub use gatehouse_docs::OpenApiGenerator;
}
