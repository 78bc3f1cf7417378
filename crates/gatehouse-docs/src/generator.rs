//! OpenAPI document generation.
//!
//! Walks a contract's route definitions and emits a static OpenAPI
//! document: parameters from the declared path/query/header schema
//! maps, a request body from the declared body schema, and one
//! response entry per declared success/failure member. The transform
//! is stateless; the same contract always renders the same document.

use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde_json::json;

use gatehouse_core::contract::MethodMap;
use gatehouse_core::response::{BodySchema, ResponseSchema};
use gatehouse_core::{Contract, RouteDefinition, Schema};

use crate::openapi::{
    Header, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem, RequestBody,
    Response, Server,
};

/// Generates OpenAPI documents from contracts.
///
/// # Example
///
/// ```
/// use gatehouse_core::response::ResponseSchema;
/// use gatehouse_core::schema::value;
/// use gatehouse_core::{Contract, RouteDefinition};
/// use gatehouse_docs::OpenApiGenerator;
/// use http::Method;
///
/// let contract = Contract::builder("notes")
///     .version("1.0.0")
///     .route(
///         "/notes",
///         Method::GET,
///         RouteDefinition::builder(ResponseSchema::new(value::array(value::any()))).build(),
///     )
///     .build();
///
/// let document = OpenApiGenerator::new().generate(&contract);
/// assert!(document.paths.contains_key("/notes"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenApiGenerator {
    servers: Vec<Server>,
    description: Option<String>,
}

impl OpenApiGenerator {
    /// Creates a generator with no servers declared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a server entry.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Sets the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Renders the contract as an OpenAPI 3.1 document.
    #[must_use]
    pub fn generate(&self, contract: &Contract) -> OpenApi {
        let mut paths = IndexMap::new();
        for (pattern, methods) in contract.paths() {
            paths.insert(pattern.to_string(), path_item(pattern, methods));
        }

        OpenApi {
            openapi: "3.1.0".to_string(),
            info: Info {
                title: contract.name().to_string(),
                version: contract.version().to_string(),
                description: self.description.clone(),
            },
            servers: self.servers.clone(),
            paths,
        }
    }
}

fn path_item(pattern: &str, methods: &MethodMap) -> PathItem {
    let mut item = PathItem::default();
    for (method, definition) in methods {
        let operation = operation(pattern, method, definition);
        match method.as_str() {
            "GET" => item.get = Some(operation),
            "PUT" => item.put = Some(operation),
            "POST" => item.post = Some(operation),
            "DELETE" => item.delete = Some(operation),
            "OPTIONS" => item.options = Some(operation),
            "HEAD" => item.head = Some(operation),
            "PATCH" => item.patch = Some(operation),
            _ => {}
        }
    }
    item
}

fn operation(pattern: &str, method: &Method, definition: &RouteDefinition) -> Operation {
    let mut parameters = Vec::new();
    for (name, schema) in definition.path_params() {
        parameters.push(Parameter {
            name: name.clone(),
            location: ParameterIn::Path,
            required: true,
            schema: Some(schema.to_json_schema()),
        });
    }
    for (name, schema) in definition.query_params() {
        parameters.push(Parameter {
            name: name.clone(),
            location: ParameterIn::Query,
            required: false,
            schema: Some(schema.to_json_schema()),
        });
    }
    for (name, schema) in definition.header_params() {
        parameters.push(Parameter {
            name: name.clone(),
            location: ParameterIn::Header,
            required: false,
            schema: Some(schema.to_json_schema()),
        });
    }

    let mut responses = IndexMap::new();
    for member in definition.success().members() {
        insert_response(&mut responses, member);
    }
    if let Some(failure) = definition.failure() {
        for member in failure.members() {
            insert_response(&mut responses, member);
        }
    }

    Operation {
        operation_id: Some(operation_id(pattern, method)),
        description: definition.description().map(ToString::to_string),
        parameters,
        request_body: definition.body().map(request_body),
        responses,
    }
}

fn request_body(body: &BodySchema) -> RequestBody {
    let mut content = IndexMap::new();
    match body {
        BodySchema::Validated(schema) => {
            content.insert(
                "application/json".to_string(),
                MediaType {
                    schema: Some(schema.to_json_schema()),
                },
            );
        }
        BodySchema::Stream => {
            content.insert(
                "application/octet-stream".to_string(),
                MediaType {
                    schema: Some(json!({"type": "string", "format": "binary"})),
                },
            );
        }
        BodySchema::Raw => {
            content.insert(
                "text/plain".to_string(),
                MediaType {
                    schema: Some(json!({"type": "string"})),
                },
            );
        }
    }
    RequestBody {
        required: true,
        content,
    }
}

fn insert_response(responses: &mut IndexMap<String, Response>, member: &ResponseSchema) {
    let key = member.status().as_u16().to_string();
    // A status declared twice keeps its first (default) shape.
    if responses.contains_key(&key) {
        return;
    }

    let mut content = IndexMap::new();
    match member.body() {
        Some(BodySchema::Validated(schema)) => {
            content.insert(
                "application/json".to_string(),
                MediaType {
                    schema: Some(schema.to_json_schema()),
                },
            );
        }
        Some(BodySchema::Stream) => {
            content.insert(
                "application/octet-stream".to_string(),
                MediaType {
                    schema: Some(json!({"type": "string", "format": "binary"})),
                },
            );
        }
        Some(BodySchema::Raw) => {
            content.insert(
                "text/plain".to_string(),
                MediaType {
                    schema: Some(json!({"type": "string"})),
                },
            );
        }
        None => {}
    }

    let headers: IndexMap<String, Header> = member
        .headers()
        .iter()
        .map(|(name, schema)| {
            (
                name.clone(),
                Header {
                    schema: Some(schema.to_json_schema()),
                },
            )
        })
        .collect();

    responses.insert(
        key,
        Response {
            description: status_description(member.status()),
            headers,
            content,
        },
    );
}

fn status_description(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_u16().to_string(), ToString::to_string)
}

fn operation_id(pattern: &str, method: &Method) -> String {
    let mut id = method.as_str().to_ascii_lowercase();
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        id.push('_');
        id.push_str(
            &segment
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>(),
        );
    }
    id
}
