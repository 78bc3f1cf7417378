//! Dispatcher and HTTP server glue for the Gatehouse routing layer.
//!
//! [`ContractService`] turns a declarative contract plus a handler
//! registry into the per-request pipeline — match, decode, handle,
//! respond — with declared-failure correlation, a pluggable error
//! formatter, and streaming-body cancellation semantics. [`serve`]
//! runs it on a hyper HTTP/1 listener.

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

use gatehouse_core::BoxError;

pub mod config;
pub mod dispatch;
pub mod format;
pub mod registry;
pub mod serve;

/// The boxed response body every dispatch produces.
pub type ServiceBody = UnsyncBoxBody<Bytes, BoxError>;

pub use config::{ResponsePolicy, ServerConfig, ServerConfigBuilder};
pub use dispatch::{ContractService, ContractServiceBuilder};
pub use format::{DefaultFormatter, DispatchError, ErrorFormatter, FormattedError};
pub use registry::{HandlerFuture, HandlerRegistry, RouteHandler};
pub use serve::{serve, ServeError};
