//! The validation-engine interface and the built-in value schemas.
//!
//! Gatehouse does not implement a schema language. Everything downstream
//! of the contract consumes validators through the [`Schema`] trait, so
//! any engine that can check a JSON value and render a JSON Schema can
//! drive the routing layer. The [`value`] module provides a small
//! concrete engine over `serde_json::Value` that covers the common
//! cases and powers the tests and demos.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A reference-counted, type-erased validator.
pub type SchemaRef = Arc<dyn Schema>;

/// An opaque validator supplied by the application.
///
/// The routing layer calls [`Schema::decode`] for every declared input
/// channel, [`Schema::tag`] to correlate handler failures to declared
/// failure members, and [`Schema::to_json_schema`] when emitting
/// documentation. How the schema represents its shape internally is of
/// no concern to the router.
pub trait Schema: Send + Sync + 'static {
    /// Validates a raw JSON value and returns the decoded value.
    ///
    /// For inputs sourced from the URL or headers the raw value is a
    /// JSON string; engines are free to coerce (e.g. `"42"` to `42`).
    fn decode(&self, value: Value) -> Result<Value, SchemaViolation>;

    /// The discriminant tag for failure correlation, if this schema
    /// describes a tagged failure shape.
    fn tag(&self) -> Option<&str> {
        None
    }

    /// Renders this schema as a JSON Schema fragment for documentation.
    fn to_json_schema(&self) -> Value;
}

/// A shared reference delegates to the schema it points at, so
/// [`SchemaRef`]s can be declared once and reused across routes.
impl Schema for Arc<dyn Schema> {
    fn decode(&self, value: Value) -> Result<Value, SchemaViolation> {
        (**self).decode(value)
    }

    fn tag(&self) -> Option<&str> {
        (**self).tag()
    }

    fn to_json_schema(&self) -> Value {
        (**self).to_json_schema()
    }
}

/// Converts validators into [`SchemaRef`]s at contract-declaration
/// sites.
pub trait IntoSchemaRef {
    /// Performs the conversion.
    fn into_schema_ref(self) -> SchemaRef;
}

impl<S: Schema> IntoSchemaRef for S {
    fn into_schema_ref(self) -> SchemaRef {
        Arc::new(self)
    }
}

/// A schema validation failure.
///
/// Carries the JSON path at which validation failed and a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// The JSON path where the violation occurred (e.g. `$.items[2].name`).
    pub path: String,
    /// The violation message.
    pub message: String,
}

impl SchemaViolation {
    /// Creates a violation at the given path.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a violation at the document root.
    #[must_use]
    pub fn at_root(message: impl Into<String>) -> Self {
        Self::new("$", message)
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed at '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for SchemaViolation {}

/// Built-in validators over `serde_json::Value`.
///
/// # Example
///
/// ```
/// use gatehouse_core::schema::{value, Schema};
/// use serde_json::json;
///
/// let schema = value::object(vec![
///     ("name", value::string().required()),
///     ("age", value::integer().minimum(0)),
/// ]);
///
/// assert!(schema.decode(json!({"name": "Alice", "age": 30})).is_ok());
/// assert!(schema.decode(json!({"age": -1})).is_err());
/// ```
pub mod value {
    use indexmap::IndexMap;
    use serde_json::{json, Value};

    use super::{Schema, SchemaViolation};

    /// A concrete JSON value schema.
    ///
    /// Values sourced from the URL or headers arrive as strings, so the
    /// numeric and boolean schemas coerce string input before checking
    /// constraints.
    #[derive(Debug, Clone)]
    pub enum ValueSchema {
        /// A string with optional length bounds.
        String {
            /// Whether a null value is rejected.
            required: bool,
            /// Minimum length in bytes.
            min_length: Option<usize>,
            /// Maximum length in bytes.
            max_length: Option<usize>,
        },
        /// An integer with optional range bounds.
        Integer {
            /// Whether a null value is rejected.
            required: bool,
            /// Inclusive minimum.
            minimum: Option<i64>,
            /// Inclusive maximum.
            maximum: Option<i64>,
        },
        /// A floating-point number with optional range bounds.
        Number {
            /// Whether a null value is rejected.
            required: bool,
            /// Inclusive minimum.
            minimum: Option<f64>,
            /// Inclusive maximum.
            maximum: Option<f64>,
        },
        /// A boolean.
        Boolean {
            /// Whether a null value is rejected.
            required: bool,
        },
        /// An array with a uniform item schema.
        Array {
            /// Whether a null value is rejected.
            required: bool,
            /// Schema every item must satisfy.
            items: Box<ValueSchema>,
            /// Minimum number of items.
            min_items: Option<usize>,
            /// Maximum number of items.
            max_items: Option<usize>,
        },
        /// An object with named properties.
        Object {
            /// Whether a null value is rejected.
            required: bool,
            /// Property schemas.
            properties: IndexMap<String, ValueSchema>,
            /// Names of properties that must be present.
            required_properties: Vec<String>,
            /// Failure-correlation tag, if this shape describes a
            /// declared failure.
            tag: Option<String>,
        },
        /// Accepts any value.
        Any,
        /// Accepts only `null`.
        Null,
    }

    /// Creates a string schema.
    #[must_use]
    pub fn string() -> ValueSchema {
        ValueSchema::String {
            required: false,
            min_length: None,
            max_length: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> ValueSchema {
        ValueSchema::Integer {
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> ValueSchema {
        ValueSchema::Number {
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> ValueSchema {
        ValueSchema::Boolean { required: false }
    }

    /// Creates an array schema with the given item schema.
    #[must_use]
    pub fn array(items: ValueSchema) -> ValueSchema {
        ValueSchema::Array {
            required: false,
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from `(name, schema)` pairs.
    ///
    /// Properties whose schema is marked [`ValueSchema::required`] are
    /// recorded as required properties of the object.
    #[must_use]
    pub fn object(properties: Vec<(&str, ValueSchema)>) -> ValueSchema {
        let required_properties: Vec<String> = properties
            .iter()
            .filter(|(_, schema)| schema.is_required())
            .map(|(name, _)| (*name).to_string())
            .collect();

        let props: IndexMap<String, ValueSchema> = properties
            .into_iter()
            .map(|(name, schema)| (name.to_string(), schema))
            .collect();

        ValueSchema::Object {
            required: false,
            properties: props,
            required_properties,
            tag: None,
        }
    }

    /// Creates a tagged object schema for a declared failure shape.
    ///
    /// The tag never appears in the wire body; it is the discriminant
    /// the dispatcher matches handler failures against.
    #[must_use]
    pub fn tagged(tag: impl Into<String>, properties: Vec<(&str, ValueSchema)>) -> ValueSchema {
        match object(properties) {
            ValueSchema::Object {
                required,
                properties,
                required_properties,
                ..
            } => ValueSchema::Object {
                required,
                properties,
                required_properties,
                tag: Some(tag.into()),
            },
            _ => unreachable!("object() always builds an Object schema"),
        }
    }

    /// Creates a schema accepting any value.
    #[must_use]
    pub fn any() -> ValueSchema {
        ValueSchema::Any
    }

    /// Creates a schema accepting only `null`.
    #[must_use]
    pub fn null() -> ValueSchema {
        ValueSchema::Null
    }

    impl ValueSchema {
        /// Marks this schema as rejecting `null`.
        #[must_use]
        pub fn required(mut self) -> Self {
            match &mut self {
                Self::String { required, .. }
                | Self::Integer { required, .. }
                | Self::Number { required, .. }
                | Self::Boolean { required }
                | Self::Array { required, .. }
                | Self::Object { required, .. } => *required = true,
                Self::Any | Self::Null => {}
            }
            self
        }

        /// Returns whether this schema rejects `null`.
        #[must_use]
        pub fn is_required(&self) -> bool {
            match self {
                Self::String { required, .. }
                | Self::Integer { required, .. }
                | Self::Number { required, .. }
                | Self::Boolean { required }
                | Self::Array { required, .. }
                | Self::Object { required, .. } => *required,
                Self::Any | Self::Null => false,
            }
        }

        /// Sets the minimum length for string schemas.
        #[must_use]
        pub fn min_length(mut self, len: usize) -> Self {
            if let Self::String { min_length, .. } = &mut self {
                *min_length = Some(len);
            }
            self
        }

        /// Sets the maximum length for string schemas.
        #[must_use]
        pub fn max_length(mut self, len: usize) -> Self {
            if let Self::String { max_length, .. } = &mut self {
                *max_length = Some(len);
            }
            self
        }

        /// Sets the inclusive minimum for integer schemas.
        #[must_use]
        pub fn minimum(mut self, min: i64) -> Self {
            if let Self::Integer { minimum, .. } = &mut self {
                *minimum = Some(min);
            }
            self
        }

        /// Sets the inclusive maximum for integer schemas.
        #[must_use]
        pub fn maximum(mut self, max: i64) -> Self {
            if let Self::Integer { maximum, .. } = &mut self {
                *maximum = Some(max);
            }
            self
        }

        /// Sets the minimum item count for array schemas.
        #[must_use]
        pub fn min_items(mut self, min: usize) -> Self {
            if let Self::Array { min_items, .. } = &mut self {
                *min_items = Some(min);
            }
            self
        }

        /// Sets the maximum item count for array schemas.
        #[must_use]
        pub fn max_items(mut self, max: usize) -> Self {
            if let Self::Array { max_items, .. } = &mut self {
                *max_items = Some(max);
            }
            self
        }

        fn decode_at_path(&self, value: Value, path: &str) -> Result<Value, SchemaViolation> {
            if value.is_null() {
                if self.is_required() {
                    return Err(SchemaViolation::new(path, "required value is null"));
                }
                return Ok(value);
            }

            match self {
                Self::String {
                    min_length,
                    max_length,
                    ..
                } => {
                    let s = value.as_str().ok_or_else(|| {
                        SchemaViolation::new(
                            path,
                            format!("expected string, got {}", type_name(&value)),
                        )
                    })?;
                    if let Some(min) = min_length {
                        if s.len() < *min {
                            return Err(SchemaViolation::new(
                                path,
                                format!("string length {} is less than minimum {min}", s.len()),
                            ));
                        }
                    }
                    if let Some(max) = max_length {
                        if s.len() > *max {
                            return Err(SchemaViolation::new(
                                path,
                                format!("string length {} is greater than maximum {max}", s.len()),
                            ));
                        }
                    }
                    Ok(value)
                }

                Self::Integer {
                    minimum, maximum, ..
                } => {
                    let n = coerce_i64(&value).ok_or_else(|| {
                        SchemaViolation::new(
                            path,
                            format!("expected integer, got {}", type_name(&value)),
                        )
                    })?;
                    if let Some(min) = minimum {
                        if n < *min {
                            return Err(SchemaViolation::new(
                                path,
                                format!("value {n} is less than minimum {min}"),
                            ));
                        }
                    }
                    if let Some(max) = maximum {
                        if n > *max {
                            return Err(SchemaViolation::new(
                                path,
                                format!("value {n} is greater than maximum {max}"),
                            ));
                        }
                    }
                    Ok(json!(n))
                }

                Self::Number {
                    minimum, maximum, ..
                } => {
                    let n = coerce_f64(&value).ok_or_else(|| {
                        SchemaViolation::new(
                            path,
                            format!("expected number, got {}", type_name(&value)),
                        )
                    })?;
                    if let Some(min) = minimum {
                        if n < *min {
                            return Err(SchemaViolation::new(
                                path,
                                format!("value {n} is less than minimum {min}"),
                            ));
                        }
                    }
                    if let Some(max) = maximum {
                        if n > *max {
                            return Err(SchemaViolation::new(
                                path,
                                format!("value {n} is greater than maximum {max}"),
                            ));
                        }
                    }
                    Ok(json!(n))
                }

                Self::Boolean { .. } => match coerce_bool(&value) {
                    Some(b) => Ok(Value::Bool(b)),
                    None => Err(SchemaViolation::new(
                        path,
                        format!("expected boolean, got {}", type_name(&value)),
                    )),
                },

                Self::Array {
                    items,
                    min_items,
                    max_items,
                    ..
                } => {
                    let arr = match value {
                        Value::Array(arr) => arr,
                        other => {
                            return Err(SchemaViolation::new(
                                path,
                                format!("expected array, got {}", type_name(&other)),
                            ))
                        }
                    };
                    if let Some(min) = min_items {
                        if arr.len() < *min {
                            return Err(SchemaViolation::new(
                                path,
                                format!("array length {} is less than minimum {min}", arr.len()),
                            ));
                        }
                    }
                    if let Some(max) = max_items {
                        if arr.len() > *max {
                            return Err(SchemaViolation::new(
                                path,
                                format!("array length {} is greater than maximum {max}", arr.len()),
                            ));
                        }
                    }
                    let mut decoded = Vec::with_capacity(arr.len());
                    for (idx, item) in arr.into_iter().enumerate() {
                        decoded.push(items.decode_at_path(item, &format!("{path}[{idx}]"))?);
                    }
                    Ok(Value::Array(decoded))
                }

                Self::Object {
                    properties,
                    required_properties,
                    ..
                } => {
                    let mut obj = match value {
                        Value::Object(obj) => obj,
                        other => {
                            return Err(SchemaViolation::new(
                                path,
                                format!("expected object, got {}", type_name(&other)),
                            ))
                        }
                    };
                    for required in required_properties {
                        if !obj.contains_key(required) {
                            return Err(SchemaViolation::new(
                                format!("{path}.{required}"),
                                format!("missing required property '{required}'"),
                            ));
                        }
                    }
                    for (key, prop_schema) in properties {
                        if let Some(prop_value) = obj.remove(key) {
                            let decoded = prop_schema
                                .decode_at_path(prop_value, &format!("{path}.{key}"))?;
                            obj.insert(key.clone(), decoded);
                        }
                    }
                    Ok(Value::Object(obj))
                }

                Self::Any => Ok(value),

                Self::Null => Err(SchemaViolation::new(
                    path,
                    format!("expected null, got {}", type_name(&value)),
                )),
            }
        }
    }

    impl Schema for ValueSchema {
        fn decode(&self, value: Value) -> Result<Value, SchemaViolation> {
            self.decode_at_path(value, "$")
        }

        fn tag(&self) -> Option<&str> {
            match self {
                Self::Object { tag, .. } => tag.as_deref(),
                _ => None,
            }
        }

        fn to_json_schema(&self) -> Value {
            match self {
                Self::String {
                    min_length,
                    max_length,
                    ..
                } => {
                    let mut schema = json!({"type": "string"});
                    if let Some(min) = min_length {
                        schema["minLength"] = json!(min);
                    }
                    if let Some(max) = max_length {
                        schema["maxLength"] = json!(max);
                    }
                    schema
                }
                Self::Integer {
                    minimum, maximum, ..
                } => {
                    let mut schema = json!({"type": "integer"});
                    if let Some(min) = minimum {
                        schema["minimum"] = json!(min);
                    }
                    if let Some(max) = maximum {
                        schema["maximum"] = json!(max);
                    }
                    schema
                }
                Self::Number {
                    minimum, maximum, ..
                } => {
                    let mut schema = json!({"type": "number"});
                    if let Some(min) = minimum {
                        schema["minimum"] = json!(min);
                    }
                    if let Some(max) = maximum {
                        schema["maximum"] = json!(max);
                    }
                    schema
                }
                Self::Boolean { .. } => json!({"type": "boolean"}),
                Self::Array {
                    items,
                    min_items,
                    max_items,
                    ..
                } => {
                    let mut schema = json!({"type": "array", "items": items.to_json_schema()});
                    if let Some(min) = min_items {
                        schema["minItems"] = json!(min);
                    }
                    if let Some(max) = max_items {
                        schema["maxItems"] = json!(max);
                    }
                    schema
                }
                Self::Object {
                    properties,
                    required_properties,
                    ..
                } => {
                    let props: serde_json::Map<String, Value> = properties
                        .iter()
                        .map(|(name, schema)| (name.clone(), schema.to_json_schema()))
                        .collect();
                    let mut schema = json!({"type": "object", "properties": props});
                    if !required_properties.is_empty() {
                        schema["required"] = json!(required_properties);
                    }
                    schema
                }
                Self::Any => json!({}),
                Self::Null => json!({"type": "null"}),
            }
        }
    }

    fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn coerce_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn coerce_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn coerce_bool(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::value;
    use super::*;
    use serde_json::json;

    #[test]
    fn string_schema_bounds() {
        let schema = value::string().min_length(2).max_length(10);

        assert!(schema.decode(json!("hello")).is_ok());
        assert!(schema.decode(json!("a")).is_err());
        assert!(schema.decode(json!("hello world!")).is_err());
        assert!(schema.decode(json!(123)).is_err());
    }

    #[test]
    fn integer_schema_coerces_url_strings() {
        let schema = value::integer().minimum(0).maximum(100);

        assert_eq!(schema.decode(json!(50)).unwrap(), json!(50));
        assert_eq!(schema.decode(json!("42")).unwrap(), json!(42));
        assert!(schema.decode(json!("fifty")).is_err());
        assert!(schema.decode(json!(-1)).is_err());
        assert!(schema.decode(json!("101")).is_err());
    }

    #[test]
    fn boolean_schema_coerces_url_strings() {
        let schema = value::boolean();

        assert_eq!(schema.decode(json!("true")).unwrap(), json!(true));
        assert_eq!(schema.decode(json!(false)).unwrap(), json!(false));
        assert!(schema.decode(json!("yes")).is_err());
    }

    #[test]
    fn array_schema_bounds_and_items() {
        let schema = value::array(value::integer()).min_items(1).max_items(3);

        assert!(schema.decode(json!([1, 2, 3])).is_ok());
        assert!(schema.decode(json!([])).is_err());
        assert!(schema.decode(json!([1, 2, 3, 4])).is_err());
        assert!(schema.decode(json!([1, "two", 3])).is_err());
    }

    #[test]
    fn object_schema_required_properties() {
        let schema = value::object(vec![
            ("name", value::string().required()),
            ("age", value::integer()),
        ]);

        assert!(schema.decode(json!({"name": "Bob"})).is_ok());
        assert!(schema.decode(json!({"age": 30})).is_err());
        assert!(schema.decode(json!({"name": 1})).is_err());
        assert!(schema.decode(json!("not an object")).is_err());
    }

    #[test]
    fn nested_violation_path() {
        let schema = value::object(vec![(
            "users",
            value::array(value::object(vec![("name", value::string().required())])),
        )]);

        let err = schema
            .decode(json!({"users": [{"name": "Alice"}, {"name": 9}]}))
            .unwrap_err();
        assert!(err.path.contains("users"));
        assert!(err.path.contains("[1]"));
        assert!(err.path.contains("name"));
    }

    #[test]
    fn tagged_schema_exposes_tag() {
        let schema = value::tagged("NoteNotFound", vec![("id", value::string().required())]);
        assert_eq!(schema.tag(), Some("NoteNotFound"));

        let untagged = value::object(vec![("id", value::string())]);
        assert_eq!(untagged.tag(), None);
    }

    #[test]
    fn json_schema_rendering() {
        let schema = value::object(vec![
            ("name", value::string().required()),
            ("count", value::integer().minimum(1)),
        ]);

        let rendered = schema.to_json_schema();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["properties"]["name"]["type"], "string");
        assert_eq!(rendered["properties"]["count"]["minimum"], 1);
        assert_eq!(rendered["required"], json!(["name"]));
    }

    #[test]
    fn any_and_null_schemas() {
        assert!(value::any().decode(json!({"free": "form"})).is_ok());
        assert!(value::null().decode(json!(null)).is_ok());
        assert!(value::null().decode(json!("x")).is_err());
    }

    #[test]
    fn violation_display() {
        let violation = SchemaViolation::new("$.name", "expected string, got number");
        assert!(violation.to_string().contains("$.name"));
        assert!(violation.to_string().contains("expected string"));
    }
}
