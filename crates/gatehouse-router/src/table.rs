//! The compiled route table.
//!
//! [`RouteTable::compile`] walks a contract in declaration order and
//! compiles each path pattern once. [`RouteTable::resolve`] then
//! answers, per request, one of three things: a match (definition plus
//! raw parameter captures), "path matched but not this method" (with
//! the allowed methods for the `Allow` header), or "nothing matched".
//! Matching stops at the first path-matching route, so declaration
//! order is the tie-breaker for ambiguous patterns.

use std::sync::Arc;

use http::Method;
use tracing::debug;

use gatehouse_core::contract::{Contract, MethodMap};
use gatehouse_core::RouteDefinition;

use crate::pattern::{PathPattern, PatternError};

/// One compiled (pattern, per-method definitions) entry.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pattern: PathPattern,
    methods: MethodMap,
}

impl CompiledRoute {
    /// Returns the compiled path pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the methods this route implements, sorted by name.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.methods.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Returns the definition for a method, if implemented.
    #[must_use]
    pub fn definition(&self, method: &Method) -> Option<&Arc<RouteDefinition>> {
        self.methods.get(method)
    }
}

/// The outcome of resolving a request against the table.
#[derive(Debug)]
pub enum RouteResolution {
    /// A route matched the path and implements the method.
    Matched {
        /// The matched pattern string, e.g. `/users/{id}`.
        pattern: String,
        /// The requested method.
        method: Method,
        /// The route definition for (pattern, method).
        definition: Arc<RouteDefinition>,
        /// Raw (undecoded) captures, in placeholder order.
        params: Vec<(String, String)>,
    },
    /// A route matched the path but does not implement the method.
    MethodNotAllowed {
        /// The methods the matched route does implement, sorted.
        allowed: Vec<Method>,
    },
    /// No route matched the path.
    NotFound,
}

/// The compiled set of routes for one contract.
///
/// Built once, read-only afterwards; concurrent resolution needs no
/// synchronization. Compiling the same contract twice yields tables
/// with identical resolution behavior.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compiles every pattern in the contract, in declaration order.
    pub fn compile(contract: &Contract) -> Result<Self, PatternError> {
        let mut routes = Vec::new();
        for (pattern, methods) in contract.paths() {
            let compiled = PathPattern::compile(pattern)?;
            debug!(
                pattern,
                methods = methods.len(),
                "compiled route pattern"
            );
            routes.push(CompiledRoute {
                pattern: compiled,
                methods: methods.clone(),
            });
        }
        debug!(routes = routes.len(), "route table compiled");
        Ok(Self { routes })
    }

    /// Returns the number of compiled routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the compiled routes, in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Resolves a request path and method.
    ///
    /// The first route whose pattern accepts the path decides the
    /// outcome: either a match, or method-not-allowed with that route's
    /// implemented methods. Routes at duplicate patterns are not
    /// merged.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> RouteResolution {
        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            return match route.methods.get(method) {
                Some(definition) => {
                    debug!(pattern = route.pattern.pattern(), %method, "route matched");
                    RouteResolution::Matched {
                        pattern: route.pattern.pattern().to_string(),
                        method: method.clone(),
                        definition: Arc::clone(definition),
                        params,
                    }
                }
                None => {
                    debug!(
                        pattern = route.pattern.pattern(),
                        %method,
                        "path matched but method not implemented"
                    );
                    RouteResolution::MethodNotAllowed {
                        allowed: route.allowed_methods(),
                    }
                }
            };
        }
        RouteResolution::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::response::ResponseSchema;
    use gatehouse_core::schema::value;
    use gatehouse_core::Contract;
    use http::StatusCode;

    fn definition() -> gatehouse_core::RouteDefinition {
        gatehouse_core::RouteDefinition::builder(ResponseSchema::new(value::any())).build()
    }

    fn contract() -> Contract {
        Contract::builder("svc")
            .route("/users", Method::GET, definition())
            .route("/users", Method::POST, definition())
            .route("/users/{userId}", Method::GET, definition())
            .route("/api/v1.0/status", Method::GET, definition())
            .build()
    }

    #[test]
    fn resolves_static_and_parameterized_paths() {
        let table = RouteTable::compile(&contract()).unwrap();

        match table.resolve(&Method::GET, "/users/42") {
            RouteResolution::Matched {
                pattern, params, ..
            } => {
                assert_eq!(pattern, "/users/{userId}");
                assert_eq!(params, vec![("userId".to_string(), "42".to_string())]);
            }
            other => panic!("expected match, got {other:?}"),
        }

        assert!(matches!(
            table.resolve(&Method::GET, "/users"),
            RouteResolution::Matched { .. }
        ));
    }

    #[test]
    fn distinguishes_method_not_allowed_from_not_found() {
        let table = RouteTable::compile(&contract()).unwrap();

        match table.resolve(&Method::DELETE, "/users") {
            RouteResolution::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("expected method-not-allowed, got {other:?}"),
        }

        assert!(matches!(
            table.resolve(&Method::GET, "/unknown"),
            RouteResolution::NotFound
        ));
    }

    #[test]
    fn escaped_literals_do_not_wildcard() {
        let table = RouteTable::compile(&contract()).unwrap();
        assert!(matches!(
            table.resolve(&Method::GET, "/api/v1.0/status"),
            RouteResolution::Matched { .. }
        ));
        assert!(matches!(
            table.resolve(&Method::GET, "/api/v1X0/status"),
            RouteResolution::NotFound
        ));
    }

    #[test]
    fn first_declared_pattern_wins() {
        let first = gatehouse_core::RouteDefinition::builder(
            ResponseSchema::new(value::any()).with_status(StatusCode::CREATED),
        )
        .build();
        let contract = Contract::builder("svc")
            .route("/items/{id}", Method::GET, first)
            .route("/items/{name}", Method::GET, definition())
            .build();
        let table = RouteTable::compile(&contract).unwrap();

        match table.resolve(&Method::GET, "/items/7") {
            RouteResolution::Matched {
                definition, params, ..
            } => {
                assert_eq!(definition.success().default_status(), StatusCode::CREATED);
                assert_eq!(params[0].0, "id");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn first_path_match_decides_method_not_allowed() {
        // The second pattern would accept the method, but matching
        // stops at the first path-matching route.
        let contract = Contract::builder("svc")
            .route("/things/{id}", Method::GET, definition())
            .route("/things/{name}", Method::POST, definition())
            .build();
        let table = RouteTable::compile(&contract).unwrap();

        match table.resolve(&Method::POST, "/things/7") {
            RouteResolution::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET]);
            }
            other => panic!("expected method-not-allowed, got {other:?}"),
        }
    }

    #[test]
    fn raw_captures_are_not_decoded() {
        let table = RouteTable::compile(&contract()).unwrap();
        match table.resolve(&Method::GET, "/users/hello%20world") {
            RouteResolution::Matched { params, .. } => {
                assert_eq!(params[0].1, "hello%20world");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn compile_is_idempotent() {
        let contract = contract();
        let first = RouteTable::compile(&contract).unwrap();
        let second = RouteTable::compile(&contract).unwrap();

        for (method, path) in [
            (Method::GET, "/users/9"),
            (Method::DELETE, "/users"),
            (Method::GET, "/missing"),
        ] {
            let a = format!("{:?}", first.resolve(&method, path));
            let b = format!("{:?}", second.resolve(&method, path));
            assert_eq!(a, b);
        }
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn invalid_pattern_fails_compilation() {
        let contract = Contract::builder("svc")
            .route("/bad/{oops", Method::GET, definition())
            .build();
        assert!(RouteTable::compile(&contract).is_err());
    }
}
