//! Decoding error types.
//!
//! A [`DecodeError`] records which channel an input failed in, which
//! parameter (when the failure is about one), and what kind of failure
//! it was — a malformed percent escape is reported differently from a
//! body that is not JSON at all, which in turn reads differently from
//! a well-formed body of the wrong shape.

use gatehouse_core::{InputChannel, InputIssue};

/// What went wrong while decoding an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A required input was absent.
    Missing,
    /// Malformed percent-encoding in a path parameter.
    InvalidEncoding,
    /// The body was not syntactically valid JSON.
    InvalidJson,
    /// Bytes that were not valid UTF-8.
    InvalidUtf8,
    /// Well-formed input that failed its schema.
    Schema,
}

/// A single channel decoding failure.
#[derive(Debug, Clone)]
pub struct DecodeError {
    channel: InputChannel,
    name: Option<String>,
    kind: DecodeErrorKind,
    message: String,
}

impl DecodeError {
    /// A missing required input.
    #[must_use]
    pub fn missing(channel: InputChannel, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            channel,
            message: format!("missing required {channel} parameter '{name}'"),
            name: Some(name),
            kind: DecodeErrorKind::Missing,
        }
    }

    /// A malformed percent escape.
    #[must_use]
    pub fn invalid_encoding(
        channel: InputChannel,
        name: impl Into<String>,
        details: impl std::fmt::Display,
    ) -> Self {
        let name = name.into();
        Self {
            channel,
            message: format!("{details}"),
            name: Some(name),
            kind: DecodeErrorKind::InvalidEncoding,
        }
    }

    /// A body that is not syntactically valid JSON.
    #[must_use]
    pub fn invalid_json(details: impl std::fmt::Display) -> Self {
        Self {
            channel: InputChannel::Body,
            name: None,
            kind: DecodeErrorKind::InvalidJson,
            message: format!("body is not valid JSON: {details}"),
        }
    }

    /// Input bytes that are not valid UTF-8.
    #[must_use]
    pub fn invalid_utf8(channel: InputChannel, name: Option<String>) -> Self {
        let what = name.as_deref().map_or_else(
            || format!("{channel} is not valid UTF-8"),
            |n| format!("{channel} parameter '{n}' is not valid UTF-8"),
        );
        Self {
            channel,
            name,
            kind: DecodeErrorKind::InvalidUtf8,
            message: what,
        }
    }

    /// A schema violation on well-formed input.
    #[must_use]
    pub fn schema(
        channel: InputChannel,
        name: Option<String>,
        violation: impl std::fmt::Display,
    ) -> Self {
        Self {
            channel,
            name,
            kind: DecodeErrorKind::Schema,
            message: format!("{violation}"),
        }
    }

    /// Returns the channel.
    #[must_use]
    pub fn channel(&self) -> InputChannel {
        self.channel
    }

    /// Returns the parameter name, if the failure concerns one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts into the wire-facing issue shape.
    #[must_use]
    pub fn into_issue(self) -> InputIssue {
        match self.name {
            Some(name) => InputIssue::named(self.channel, name, self.message),
            None => InputIssue::channel(self.channel, self.message),
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mentions_channel_and_name() {
        let err = DecodeError::missing(InputChannel::Query, "limit");
        assert_eq!(err.channel(), InputChannel::Query);
        assert_eq!(err.name(), Some("limit"));
        assert_eq!(err.kind(), DecodeErrorKind::Missing);
        assert!(err.message().contains("query"));
        assert!(err.message().contains("limit"));
    }

    #[test]
    fn invalid_json_is_distinct_from_schema() {
        let json_err = DecodeError::invalid_json("expected value at line 1 column 1");
        let shape_err = DecodeError::schema(
            InputChannel::Body,
            None,
            "validation failed at '$.name': expected string, got number",
        );

        assert_eq!(json_err.kind(), DecodeErrorKind::InvalidJson);
        assert_eq!(shape_err.kind(), DecodeErrorKind::Schema);
        assert!(json_err.message().contains("not valid JSON"));
        assert!(!shape_err.message().contains("not valid JSON"));
    }

    #[test]
    fn issue_conversion_keeps_structure() {
        let issue = DecodeError::missing(InputChannel::Header, "x-tenant").into_issue();
        assert_eq!(issue.channel, InputChannel::Header);
        assert_eq!(issue.name.as_deref(), Some("x-tenant"));

        let issue = DecodeError::invalid_json("bad").into_issue();
        assert_eq!(issue.channel, InputChannel::Body);
        assert!(issue.name.is_none());
    }
}
