//! Per-channel request decoding.
//!
//! [`decode_request`] validates the four input channels of a matched
//! request — path, query, headers, body — against the route
//! definition's declared schemas. The channels are independent: each
//! one is decoded against the immutable request regardless of the
//! others, and when several fail the reported issues are ordered by a
//! fixed channel priority (path, query, headers, body) so the outcome
//! is deterministic.

use bytes::Bytes;
use http::HeaderMap;
use serde_json::{Map, Value};

use gatehouse_core::{
    BodySchema, ByteStream, InputChannel, RouteDefinition, RouteError, Schema,
};

use crate::error::DecodeError;
use crate::percent::percent_decode;

/// The request body as the dispatcher hands it to the decoder.
///
/// Routes declaring a streaming body receive the stream untouched;
/// everything else is read to completion first.
#[derive(Debug)]
pub enum BodyInput {
    /// No body was sent.
    Empty,
    /// The fully-read body bytes.
    Bytes(Bytes),
    /// The unread body stream.
    Stream(ByteStream),
}

/// The decoded inputs of one request.
#[derive(Debug)]
pub struct DecodedInput {
    /// Decoded path parameters as a JSON object.
    pub path: Value,
    /// Decoded query parameters as a JSON object.
    pub query: Value,
    /// Decoded headers as a JSON object, keyed by lowercased name.
    pub headers: Value,
    /// The decoded body value (JSON, or a string for raw bodies).
    pub body: Option<Value>,
    /// The pass-through body stream for stream routes.
    pub stream: Option<ByteStream>,
}

/// Decodes every input channel of a matched request.
///
/// `raw_params` are the raw (undecoded) path captures from the route
/// match. On failure, returns a [`RouteError::Validation`] whose issues
/// are ordered by channel priority.
pub fn decode_request(
    definition: &RouteDefinition,
    raw_params: &[(String, String)],
    query: Option<&str>,
    headers: &HeaderMap,
    body: BodyInput,
) -> Result<DecodedInput, RouteError> {
    let mut errors: Vec<DecodeError> = Vec::new();

    let path = decode_path_channel(definition, raw_params, &mut errors);
    let query = decode_query_channel(definition, query, &mut errors);
    let header_values = decode_header_channel(definition, headers, &mut errors);
    let (body, stream) = decode_body_channel(definition, body, &mut errors);

    if errors.is_empty() {
        Ok(DecodedInput {
            path,
            query,
            headers: header_values,
            body,
            stream,
        })
    } else {
        Err(RouteError::validation(
            errors.into_iter().map(DecodeError::into_issue).collect(),
        ))
    }
}

fn decode_path_channel(
    definition: &RouteDefinition,
    raw_params: &[(String, String)],
    errors: &mut Vec<DecodeError>,
) -> Value {
    let mut decoded = Map::new();

    // Captures without a declared schema pass through as raw strings.
    for (name, raw) in raw_params {
        if !definition.path_params().contains_key(name) {
            decoded.insert(name.clone(), Value::String(raw.clone()));
        }
    }

    for (name, schema) in definition.path_params() {
        let Some((_, raw)) = raw_params.iter().find(|(n, _)| n == name) else {
            errors.push(DecodeError::missing(InputChannel::Path, name));
            continue;
        };

        let candidate = if definition.decode_path() {
            match percent_decode(raw) {
                Ok(decoded) => decoded,
                Err(err) => {
                    errors.push(DecodeError::invalid_encoding(InputChannel::Path, name, err));
                    continue;
                }
            }
        } else {
            raw.clone()
        };

        match schema.decode(Value::String(candidate)) {
            Ok(value) => {
                decoded.insert(name.clone(), value);
            }
            Err(violation) => errors.push(DecodeError::schema(
                InputChannel::Path,
                Some(name.clone()),
                violation,
            )),
        }
    }

    Value::Object(decoded)
}

fn decode_query_channel(
    definition: &RouteDefinition,
    query: Option<&str>,
    errors: &mut Vec<DecodeError>,
) -> Value {
    let mut decoded = Map::new();
    if definition.query_params().is_empty() {
        return Value::Object(decoded);
    }

    let pairs: Vec<(String, String)> = match query {
        Some(raw) => match serde_urlencoded::from_str(raw) {
            Ok(pairs) => pairs,
            Err(err) => {
                errors.push(DecodeError::schema(
                    InputChannel::Query,
                    None,
                    format!("malformed query string: {err}"),
                ));
                return Value::Object(decoded);
            }
        },
        None => Vec::new(),
    };

    for (name, schema) in definition.query_params() {
        // Last occurrence wins for repeated parameters.
        let Some((_, raw)) = pairs.iter().rfind(|(n, _)| n == name) else {
            // Absent parameters are omitted so schemas may treat them
            // as optional.
            continue;
        };

        match schema.decode(Value::String(raw.clone())) {
            Ok(value) => {
                decoded.insert(name.clone(), value);
            }
            Err(violation) => errors.push(DecodeError::schema(
                InputChannel::Query,
                Some(name.clone()),
                violation,
            )),
        }
    }

    Value::Object(decoded)
}

fn decode_header_channel(
    definition: &RouteDefinition,
    headers: &HeaderMap,
    errors: &mut Vec<DecodeError>,
) -> Value {
    let mut decoded = Map::new();

    for (name, schema) in definition.header_params() {
        let Some(raw) = headers.get(name.as_str()) else {
            continue;
        };
        let Ok(raw) = raw.to_str() else {
            errors.push(DecodeError::invalid_utf8(
                InputChannel::Header,
                Some(name.clone()),
            ));
            continue;
        };

        match schema.decode(Value::String(raw.to_string())) {
            Ok(value) => {
                decoded.insert(name.to_ascii_lowercase(), value);
            }
            Err(violation) => errors.push(DecodeError::schema(
                InputChannel::Header,
                Some(name.clone()),
                violation,
            )),
        }
    }

    Value::Object(decoded)
}

fn decode_body_channel(
    definition: &RouteDefinition,
    body: BodyInput,
    errors: &mut Vec<DecodeError>,
) -> (Option<Value>, Option<ByteStream>) {
    let Some(declared) = definition.body() else {
        return (None, None);
    };

    match declared {
        BodySchema::Stream => {
            let stream = match body {
                BodyInput::Stream(stream) => Some(stream),
                BodyInput::Bytes(bytes) => Some(ByteStream::from_bytes(bytes)),
                BodyInput::Empty => None,
            };
            (None, stream)
        }

        BodySchema::Raw => match body_text(body, errors) {
            Some(text) => (Some(Value::String(text)), None),
            None => (None, None),
        },

        BodySchema::Validated(schema) => {
            let Some(text) = body_text(body, errors) else {
                return (None, None);
            };
            if text.is_empty() {
                return (None, None);
            }
            let parsed: Value = match serde_json::from_str(&text) {
                Ok(parsed) => parsed,
                Err(err) => {
                    errors.push(DecodeError::invalid_json(err));
                    return (None, None);
                }
            };
            match schema.decode(parsed) {
                Ok(value) => (Some(value), None),
                Err(violation) => {
                    errors.push(DecodeError::schema(InputChannel::Body, None, violation));
                    (None, None)
                }
            }
        }
    }
}

fn body_text(body: BodyInput, errors: &mut Vec<DecodeError>) -> Option<String> {
    let bytes = match body {
        BodyInput::Empty => return Some(String::new()),
        BodyInput::Bytes(bytes) => bytes,
        // Stream input for a non-stream route: the dispatcher reads
        // bodies up front for such routes, so this is defensive
        // normalization for direct library use.
        BodyInput::Stream(_) => return Some(String::new()),
    };
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Some(text),
        Err(_) => {
            errors.push(DecodeError::invalid_utf8(InputChannel::Body, None));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::response::ResponseSchema;
    use gatehouse_core::schema::value;
    use gatehouse_core::RouteDefinition;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect()
    }

    fn success() -> ResponseSchema {
        ResponseSchema::new(value::any())
    }

    #[test]
    fn decodes_all_channels() {
        let definition = RouteDefinition::builder(success())
            .path_param("id", value::integer())
            .query_param("verbose", value::boolean())
            .header_param("X-Tenant", value::string())
            .body(value::object(vec![("name", value::string().required())]))
            .build();

        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", "acme".parse().unwrap());

        let decoded = decode_request(
            &definition,
            &params(&[("id", "42")]),
            Some("verbose=true"),
            &headers,
            BodyInput::Bytes(Bytes::from(r#"{"name":"widget"}"#)),
        )
        .unwrap();

        assert_eq!(decoded.path, json!({"id": 42}));
        assert_eq!(decoded.query, json!({"verbose": true}));
        assert_eq!(decoded.headers, json!({"x-tenant": "acme"}));
        assert_eq!(decoded.body, Some(json!({"name": "widget"})));
        assert!(decoded.stream.is_none());
    }

    #[test]
    fn path_params_are_percent_decoded_by_default() {
        let definition = RouteDefinition::builder(success())
            .path_param("name", value::string())
            .build();

        let decoded = decode_request(
            &definition,
            &params(&[("name", "hello%20world")]),
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();

        assert_eq!(decoded.path, json!({"name": "hello world"}));
    }

    #[test]
    fn raw_path_policy_skips_decoding() {
        let definition = RouteDefinition::builder(success())
            .path_param("name", value::string())
            .decode_path(false)
            .build();

        let decoded = decode_request(
            &definition,
            &params(&[("name", "hello%20world")]),
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();

        assert_eq!(decoded.path, json!({"name": "hello%20world"}));
    }

    #[test]
    fn malformed_escape_is_a_validation_error_only_when_decoding() {
        let definition = RouteDefinition::builder(success())
            .path_param("name", value::string())
            .build();

        let err = decode_request(
            &definition,
            &params(&[("name", "%ZZ")]),
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap_err();
        let RouteError::Validation { issues } = &err else {
            panic!("expected validation error");
        };
        assert_eq!(issues[0].channel, InputChannel::Path);
        assert!(issues[0].message.contains("invalid URL encoding"));

        let raw_definition = RouteDefinition::builder(success())
            .path_param("name", value::string())
            .decode_path(false)
            .build();
        let decoded = decode_request(
            &raw_definition,
            &params(&[("name", "%ZZ")]),
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();
        assert_eq!(decoded.path, json!({"name": "%ZZ"}));
    }

    #[test]
    fn undeclared_captures_pass_through_raw() {
        let definition = RouteDefinition::builder(success()).build();

        let decoded = decode_request(
            &definition,
            &params(&[("slug", "a%2Fb")]),
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();

        assert_eq!(decoded.path, json!({"slug": "a%2Fb"}));
    }

    #[test]
    fn absent_query_params_are_omitted() {
        let definition = RouteDefinition::builder(success())
            .query_param("limit", value::integer())
            .build();

        let decoded = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();

        assert_eq!(decoded.query, json!({}));
    }

    #[test]
    fn repeated_query_param_last_wins() {
        let definition = RouteDefinition::builder(success())
            .query_param("limit", value::integer())
            .build();

        let decoded = decode_request(
            &definition,
            &[],
            Some("limit=10&limit=20"),
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();

        assert_eq!(decoded.query, json!({"limit": 20}));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let definition = RouteDefinition::builder(success())
            .header_param("X-Request-Id", value::string())
            .build();

        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc-123".parse().unwrap());

        let decoded = decode_request(
            &definition,
            &[],
            None,
            &headers,
            BodyInput::Empty,
        )
        .unwrap();

        assert_eq!(decoded.headers, json!({"x-request-id": "abc-123"}));
    }

    #[test]
    fn invalid_json_and_wrong_shape_read_differently() {
        let definition = RouteDefinition::builder(success())
            .body(value::object(vec![("name", value::string().required())]))
            .build();

        let syntax = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Bytes(Bytes::from("not json at all")),
        )
        .unwrap_err();
        let RouteError::Validation { issues } = &syntax else {
            panic!("expected validation error");
        };
        assert!(issues[0].message.contains("not valid JSON"));

        let shape = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Bytes(Bytes::from(r#"{"name": 7}"#)),
        )
        .unwrap_err();
        let RouteError::Validation { issues } = &shape else {
            panic!("expected validation error");
        };
        assert!(!issues[0].message.contains("not valid JSON"));
        assert!(issues[0].message.contains("expected string"));
    }

    #[test]
    fn empty_body_decodes_to_none() {
        let definition = RouteDefinition::builder(success())
            .body(value::object(vec![("name", value::string())]))
            .build();

        let decoded = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap();
        assert!(decoded.body.is_none());
    }

    #[test]
    fn stream_body_passes_through_unread() {
        let definition = RouteDefinition::builder(success()).stream_body().build();

        let decoded = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Stream(ByteStream::from_bytes("raw bytes")),
        )
        .unwrap();

        assert!(decoded.body.is_none());
        assert!(decoded.stream.is_some());
    }

    #[test]
    fn raw_body_skips_json_parsing() {
        let definition = RouteDefinition::builder(success()).raw_body().build();

        let decoded = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Bytes(Bytes::from("plain text, not json")),
        )
        .unwrap();

        assert_eq!(decoded.body, Some(json!("plain text, not json")));
    }

    #[test]
    fn failures_are_ordered_by_channel_priority() {
        let definition = RouteDefinition::builder(success())
            .path_param("id", value::integer())
            .query_param("limit", value::integer())
            .body(value::object(vec![("name", value::string().required())]))
            .build();

        let err = decode_request(
            &definition,
            &params(&[("id", "not-a-number")]),
            Some("limit=also-bad"),
            &HeaderMap::new(),
            BodyInput::Bytes(Bytes::from("{}")),
        )
        .unwrap_err();

        let RouteError::Validation { issues } = &err else {
            panic!("expected validation error");
        };
        assert_eq!(issues[0].channel, InputChannel::Path);
        assert_eq!(issues[1].channel, InputChannel::Query);
        assert_eq!(issues[2].channel, InputChannel::Body);
    }

    #[test]
    fn missing_capture_for_declared_param() {
        let definition = RouteDefinition::builder(success())
            .path_param("id", value::string())
            .build();

        let err = decode_request(
            &definition,
            &[],
            None,
            &HeaderMap::new(),
            BodyInput::Empty,
        )
        .unwrap_err();

        let RouteError::Validation { issues } = &err else {
            panic!("expected validation error");
        };
        assert!(issues[0].message.contains("missing"));
    }
}
