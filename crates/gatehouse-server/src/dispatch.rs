//! Request dispatch.
//!
//! [`ContractService`] drives one request through the pipeline:
//! resolve against the route table, decode the input channels, invoke
//! the registered handler, and render the outcome — a typed response,
//! a declared failure, or a formatted error. The dispatcher always
//! produces a response; nothing escapes as an error to the caller.
//!
//! Streaming requests get the cancellation contract from the route
//! layer: if the request fails in any way while the body stream sits
//! unconsumed, the stream is actively canceled to release the
//! connection. A successful request never has its stream canceled,
//! even when the handler left it partially read on purpose.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{header, HeaderMap, Response, StatusCode};
use http_body_util::{BodyExt, BodyStream, Full, StreamBody};
use futures_util::{StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use gatehouse_core::{
    BodySchema, BoxError, ByteStream, Contract, HandlerFailure, InputChannel, InputIssue,
    RequestContext, RequestId, ResponseBody, RouteDefinition, RouteError, StreamSlot,
    TypedResponse,
};
use gatehouse_extract::{decode_request, BodyInput};
use gatehouse_router::{PatternError, RouteResolution, RouteTable};

use crate::config::{ResponsePolicy, ServerConfig, DEFAULT_BODY_LIMIT};
use crate::format::{DefaultFormatter, DispatchError, ErrorFormatter, FormattedError};
use crate::registry::HandlerRegistry;
use crate::ServiceBody;

/// A compiled contract plus its handlers: the per-request pipeline.
///
/// Built once from a [`Contract`]; immutable and cheaply shareable
/// across connections behind an `Arc`.
pub struct ContractService {
    table: RouteTable,
    handlers: HandlerRegistry,
    formatter: Arc<dyn ErrorFormatter>,
    policy: ResponsePolicy,
    body_limit: usize,
}

impl ContractService {
    /// Creates a builder for the given contract.
    #[must_use]
    pub fn builder(contract: Contract) -> ContractServiceBuilder {
        ContractServiceBuilder {
            contract,
            handlers: HandlerRegistry::new(),
            formatter: Arc::new(DefaultFormatter),
            policy: ResponsePolicy::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Returns the compiled route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Adapts an `http` request with any byte body into a dispatch.
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response<ServiceBody>
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let stream = ByteStream::new(BodyStream::new(body).filter_map(|result| {
            futures_util::future::ready(match result {
                Ok(frame) => frame.into_data().ok().map(Ok::<_, BoxError>),
                Err(error) => Some(Err(error.into())),
            })
        }));
        self.dispatch(parts, stream).await
    }

    /// Runs the full pipeline for one request.
    pub async fn dispatch(&self, parts: Parts, body: ByteStream) -> Response<ServiceBody> {
        let request_id = RequestId::new();
        let path = parts.uri.path().to_string();
        debug!(%request_id, method = %parts.method, path = %path, "dispatching request");

        let (pattern, definition, params) = match self.table.resolve(&parts.method, &path) {
            RouteResolution::Matched {
                pattern,
                definition,
                params,
                ..
            } => (pattern, definition, params),
            RouteResolution::MethodNotAllowed { allowed } => {
                let error = RouteError::method_not_allowed(path, parts.method.clone(), allowed);
                return self.fail(None, &DispatchError::Route(error), &parts);
            }
            RouteResolution::NotFound => {
                let error = RouteError::not_found(path);
                return self.fail(None, &DispatchError::Route(error), &parts);
            }
        };

        // Stage the body: stream routes keep the stream unread, other
        // routes with a declared body are buffered up front.
        let (input, held) = match self.stage_body(&definition, body).await {
            Ok(staged) => staged,
            Err(error) => return self.fail(None, &DispatchError::Route(error), &parts),
        };

        let mut decoded = match decode_request(
            &definition,
            &params,
            parts.uri.query(),
            &parts.headers,
            input,
        ) {
            Ok(decoded) => decoded,
            Err(error) => {
                if let Some(stream) = held {
                    stream.cancel();
                }
                return self.fail(None, &DispatchError::Route(error), &parts);
            }
        };
        if held.is_some() {
            decoded.stream = held;
        }

        let Some(handler) = self.handlers.get(&pattern, &parts.method) else {
            // Declared in the contract but never wired up: a
            // configuration defect, surfaced as not-found.
            warn!(pattern = %pattern, method = %parts.method, "route declared but no handler registered");
            if let Some(stream) = decoded.stream {
                stream.cancel();
            }
            let error = RouteError::not_found(path);
            return self.fail(None, &DispatchError::Route(error), &parts);
        };
        let handler = Arc::clone(handler);

        let ctx = RequestContext::new(
            request_id,
            Arc::clone(&definition),
            decoded.path,
            decoded.query,
            decoded.headers,
            decoded.body,
            decoded.stream,
        );
        let slot = ctx.stream_slot();

        match handler(ctx).await {
            Ok(typed) => match self.render_success(typed, &definition) {
                Ok(response) => response,
                Err(error) => self.fail(slot, &error, &parts),
            },
            Err(failure) => {
                if let Some(response) = render_declared_failure(&failure, &definition) {
                    cancel_unconsumed(slot);
                    response
                } else {
                    self.fail(slot, &DispatchError::Handler(failure), &parts)
                }
            }
        }
    }

    async fn stage_body(
        &self,
        definition: &RouteDefinition,
        body: ByteStream,
    ) -> Result<(BodyInput, Option<ByteStream>), RouteError> {
        match definition.body() {
            Some(BodySchema::Stream) => Ok((BodyInput::Empty, Some(body))),
            Some(_) => {
                let bytes = body.collect_bytes().await.map_err(|err| {
                    RouteError::validation(vec![InputIssue::channel(
                        InputChannel::Body,
                        format!("failed to read request body: {err}"),
                    )])
                })?;
                if bytes.len() > self.body_limit {
                    return Err(RouteError::validation(vec![InputIssue::channel(
                        InputChannel::Body,
                        format!(
                            "body of {} bytes exceeds the {} byte limit",
                            bytes.len(),
                            self.body_limit
                        ),
                    )]));
                }
                if bytes.is_empty() {
                    Ok((BodyInput::Empty, None))
                } else {
                    Ok((BodyInput::Bytes(bytes), None))
                }
            }
            None => Ok((BodyInput::Empty, None)),
        }
    }

    fn render_success(
        &self,
        typed: TypedResponse,
        definition: &RouteDefinition,
    ) -> Result<Response<ServiceBody>, DispatchError> {
        let (body, status, headers) = typed.into_parts();

        let status = match status {
            Some(chosen) => {
                if definition.success().allows_status(chosen) {
                    chosen
                } else {
                    warn!(%chosen, "handler chose a status not declared by the success descriptor");
                    return Err(DispatchError::Handler(HandlerFailure::other(
                        anyhow::anyhow!("undeclared response status {chosen}"),
                    )));
                }
            }
            None => definition.success().default_status(),
        };

        // A `null` body serializes as an empty response.
        let body = match body {
            ResponseBody::Json(Value::Null) => ResponseBody::Empty,
            other => other,
        };

        let status = if self.policy.remap_empty_ok
            && status == StatusCode::OK
            && matches!(body, ResponseBody::Empty)
        {
            StatusCode::NO_CONTENT
        } else {
            status
        };

        Ok(build_response(status, body, headers))
    }

    fn fail(
        &self,
        slot: Option<StreamSlot>,
        error: &DispatchError,
        parts: &Parts,
    ) -> Response<ServiceBody> {
        cancel_unconsumed(slot);
        if let DispatchError::Handler(failure) = error {
            warn!(error = %failure, "handler failed with an undeclared error");
        }

        match catch_unwind(AssertUnwindSafe(|| self.formatter.format(error, parts))) {
            Ok(FormattedError::Descriptor {
                status,
                body,
                headers,
            }) => build_response(status, ResponseBody::Json(body), headers),
            Ok(FormattedError::Response(response)) => response,
            Err(_) => {
                warn!("error formatter panicked; returning a bare 500");
                let mut response = Response::new(empty_body());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

impl std::fmt::Debug for ContractService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractService")
            .field("routes", &self.table.len())
            .field("handlers", &self.handlers.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ContractService`].
pub struct ContractServiceBuilder {
    contract: Contract,
    handlers: HandlerRegistry,
    formatter: Arc<dyn ErrorFormatter>,
    policy: ResponsePolicy,
    body_limit: usize,
}

impl ContractServiceBuilder {
    /// Replaces the handler registry wholesale.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Registers one handler.
    #[must_use]
    pub fn handler<F, Fut>(mut self, pattern: impl Into<String>, method: http::Method, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<TypedResponse, HandlerFailure>> + Send + 'static,
    {
        self.handlers.register(pattern, method, f);
        self
    }

    /// Registers one bare-value handler.
    #[must_use]
    pub fn value_handler<F, Fut>(
        mut self,
        pattern: impl Into<String>,
        method: http::Method,
        f: F,
    ) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, HandlerFailure>> + Send + 'static,
    {
        self.handlers.register_value(pattern, method, f);
        self
    }

    /// Replaces the error formatter, consulted for any error not
    /// claimed by a declared failure member.
    #[must_use]
    pub fn formatter(mut self, formatter: impl ErrorFormatter) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    /// Sets the response policy.
    #[must_use]
    pub fn policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the buffered body limit.
    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Adopts policy and body limit from a server configuration.
    #[must_use]
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.policy = config.policy();
        self.body_limit = config.body_limit();
        self
    }

    /// Compiles the route table and builds the service.
    ///
    /// Operations declared in the contract without a registered
    /// handler are logged: they will answer 404 at runtime.
    pub fn build(self) -> Result<ContractService, PatternError> {
        let table = RouteTable::compile(&self.contract)?;
        for (pattern, methods) in self.contract.paths() {
            for method in methods.keys() {
                if !self.handlers.contains(pattern, method) {
                    warn!(pattern, %method, "declared operation has no handler");
                }
            }
        }
        Ok(ContractService {
            table,
            handlers: self.handlers,
            formatter: self.formatter,
            policy: self.policy,
            body_limit: self.body_limit,
        })
    }
}

fn render_declared_failure(
    failure: &HandlerFailure,
    definition: &RouteDefinition,
) -> Option<Response<ServiceBody>> {
    let HandlerFailure::Declared { tag, body } = failure else {
        return None;
    };
    let descriptor = definition.failure()?;
    let member = descriptor
        .members()
        .iter()
        .find(|member| member.tag() == Some(tag.as_str()))?;
    debug!(tag = %tag, status = %member.status(), "failure matched a declared member");
    Some(build_response(
        member.status(),
        ResponseBody::Json(body.clone()),
        HeaderMap::new(),
    ))
}

fn cancel_unconsumed(slot: Option<StreamSlot>) {
    let Some(slot) = slot else { return };
    if let Ok(mut guard) = slot.lock() {
        if let Some(stream) = guard.take() {
            debug!("canceling unconsumed request body stream");
            stream.cancel();
        }
    };
}

fn build_response(
    status: StatusCode,
    body: ResponseBody,
    headers: HeaderMap,
) -> Response<ServiceBody> {
    let (service_body, default_content_type): (ServiceBody, Option<&'static str>) = match body {
        ResponseBody::Empty => (empty_body(), None),
        ResponseBody::Json(value) => (
            full_body(Bytes::from(serde_json::to_vec(&value).unwrap_or_default())),
            Some("application/json"),
        ),
        ResponseBody::Text(text) => (
            full_body(Bytes::from(text)),
            Some("text/plain; charset=utf-8"),
        ),
        ResponseBody::Stream(stream) => (stream_body(stream), Some("application/octet-stream")),
    };

    let mut response = Response::new(service_body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    if let Some(content_type) = default_content_type {
        if !response.headers().contains_key(header::CONTENT_TYPE) {
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static(content_type),
            );
        }
    }
    response
}

/// Boxes a buffered body.
pub(crate) fn full_body(bytes: Bytes) -> ServiceBody {
    Full::new(bytes).map_err(|never| match never {}).boxed_unsync()
}

/// Boxes an empty body.
pub(crate) fn empty_body() -> ServiceBody {
    full_body(Bytes::new())
}

fn stream_body(stream: ByteStream) -> ServiceBody {
    BodyExt::boxed_unsync(StreamBody::new(stream.map_ok(http_body::Frame::data)))
}
