//! Handler registration.
//!
//! Maps (path pattern, method) pairs to type-erased async handlers.
//! Handlers receive the decoded [`RequestContext`] and return either a
//! [`TypedResponse`] or a [`HandlerFailure`]; the erasure happens here
//! so the dispatcher can store heterogeneous handlers in one map.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use gatehouse_core::{HandlerFailure, RequestContext, TypedResponse};

/// The boxed future every erased handler returns.
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<TypedResponse, HandlerFailure>> + Send>>;

/// A type-erased route handler.
pub type RouteHandler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// Registry of route handlers, keyed by (pattern, method).
///
/// # Example
///
/// ```
/// use gatehouse_server::HandlerRegistry;
/// use http::Method;
/// use serde_json::json;
///
/// let mut registry = HandlerRegistry::new();
/// registry.register_value("/health", Method::GET, |_ctx| async move {
///     Ok(json!({"ok": true}))
/// });
/// assert!(registry.contains("/health", &Method::GET));
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<(String, Method), RouteHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler returning a [`TypedResponse`].
    pub fn register<F, Fut>(&mut self, pattern: impl Into<String>, method: Method, handler: F)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TypedResponse, HandlerFailure>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RouteHandler = Arc::new(move |ctx: RequestContext| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(ctx).await })
        });
        self.handlers.insert((pattern.into(), method), erased);
    }

    /// Registers a handler returning a bare JSON value, sent at the
    /// success descriptor's default status with no extra headers.
    pub fn register_value<F, Fut>(&mut self, pattern: impl Into<String>, method: Method, handler: F)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerFailure>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RouteHandler = Arc::new(move |ctx: RequestContext| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(ctx).await.map(TypedResponse::json) })
        });
        self.handlers.insert((pattern.into(), method), erased);
    }

    /// Looks up the handler for a (pattern, method) pair.
    #[must_use]
    pub fn get(&self, pattern: &str, method: &Method) -> Option<&RouteHandler> {
        self.handlers.get(&(pattern.to_string(), method.clone()))
    }

    /// Returns whether a handler is registered for the pair.
    #[must_use]
    pub fn contains(&self, pattern: &str, method: &Method) -> bool {
        self.handlers
            .contains_key(&(pattern.to_string(), method.clone()))
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterates registered (pattern, method) keys.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &Method)> {
        self.handlers.keys().map(|(p, m)| (p.as_str(), m))
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::response::ResponseSchema;
    use gatehouse_core::schema::value;
    use gatehouse_core::RouteDefinition;
    use serde_json::json;
    use std::sync::Arc as StdArc;

    fn ctx() -> RequestContext {
        RequestContext::mock(StdArc::new(
            RouteDefinition::builder(ResponseSchema::new(value::any())).build(),
        ))
    }

    #[test]
    fn registers_and_looks_up() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        registry.register("/users", Method::GET, |_ctx| async move {
            Ok(TypedResponse::json(json!([])))
        });
        registry.register_value("/users", Method::POST, |_ctx| async move {
            Ok(json!({"id": 1}))
        });

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("/users", &Method::GET));
        assert!(registry.contains("/users", &Method::POST));
        assert!(!registry.contains("/users", &Method::DELETE));
        assert!(registry.get("/other", &Method::GET).is_none());
    }

    #[tokio::test]
    async fn erased_handler_runs() {
        let mut registry = HandlerRegistry::new();
        registry.register_value("/greet", Method::GET, |_ctx| async move {
            Ok(json!({"greeting": "hello"}))
        });

        let handler = registry.get("/greet", &Method::GET).unwrap();
        let response = handler(ctx()).await.unwrap();
        assert_eq!(response.status(), None);
    }

    #[tokio::test]
    async fn erased_handler_propagates_failures() {
        let mut registry = HandlerRegistry::new();
        registry.register("/boom", Method::GET, |_ctx| async move {
            Err(HandlerFailure::other(anyhow::anyhow!("kaput")))
        });

        let handler = registry.get("/boom", &Method::GET).unwrap();
        assert!(handler(ctx()).await.is_err());
    }

    #[test]
    fn debug_lists_keys() {
        let mut registry = HandlerRegistry::new();
        registry.register_value("/x", Method::GET, |_ctx| async move { Ok(json!(null)) });
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("/x"));
    }
}
