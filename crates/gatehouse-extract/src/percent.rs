//! Strict percent-decoding.
//!
//! Path parameters are percent-decoded before validation when the
//! route's `decode_path` policy is on. Unlike the lenient decoders in
//! the URL ecosystem, which pass malformed escapes through untouched,
//! this one reports them: a malformed escape in a path parameter must
//! surface as a validation error, not silently validate as a literal
//! `%`.

use thiserror::Error;

/// A malformed percent-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentError {
    /// A `%` with fewer than two following characters.
    #[error("invalid URL encoding: truncated escape at byte {position}")]
    Truncated {
        /// Byte offset of the `%`.
        position: usize,
    },

    /// A `%` followed by non-hex characters.
    #[error("invalid URL encoding: invalid escape at byte {position}")]
    InvalidHex {
        /// Byte offset of the `%`.
        position: usize,
    },

    /// The decoded bytes are not valid UTF-8.
    #[error("invalid URL encoding: decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

/// Decodes percent escapes, rejecting malformed input.
///
/// `+` is left as-is: this decoder is for path segments, where `+` has
/// no special meaning.
///
/// ```
/// use gatehouse_extract::percent::percent_decode;
///
/// assert_eq!(percent_decode("hello%20world").unwrap(), "hello world");
/// assert_eq!(percent_decode("plain").unwrap(), "plain");
/// assert!(percent_decode("%ZZ").is_err());
/// ```
pub fn percent_decode(input: &str) -> Result<String, PercentError> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let (hi, lo) = match (bytes.get(i + 1), bytes.get(i + 2)) {
                (Some(hi), Some(lo)) => (*hi, *lo),
                _ => return Err(PercentError::Truncated { position: i }),
            };
            let hi = hex_value(hi).ok_or(PercentError::InvalidHex { position: i })?;
            let lo = hex_value(lo).ok_or(PercentError::InvalidHex { position: i })?;
            decoded.push(hi * 16 + lo);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).map_err(|_| PercentError::InvalidUtf8)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_escapes() {
        assert_eq!(percent_decode("hello%20world").unwrap(), "hello world");
        assert_eq!(percent_decode("a%2Fb").unwrap(), "a/b");
        assert_eq!(percent_decode("%C3%A9clair").unwrap(), "éclair");
        assert_eq!(percent_decode("100%25").unwrap(), "100%");
    }

    #[test]
    fn passes_plain_strings_through() {
        assert_eq!(percent_decode("plain-text_1.2").unwrap(), "plain-text_1.2");
        assert_eq!(percent_decode("").unwrap(), "");
    }

    #[test]
    fn plus_is_not_a_space_in_paths() {
        assert_eq!(percent_decode("a+b").unwrap(), "a+b");
    }

    #[test]
    fn rejects_invalid_hex() {
        let err = percent_decode("%ZZ").unwrap_err();
        assert!(matches!(err, PercentError::InvalidHex { position: 0 }));
        assert!(err.to_string().contains("invalid URL encoding"));
    }

    #[test]
    fn rejects_truncated_escapes() {
        assert!(matches!(
            percent_decode("abc%2").unwrap_err(),
            PercentError::Truncated { position: 3 }
        ));
        assert!(matches!(
            percent_decode("abc%").unwrap_err(),
            PercentError::Truncated { position: 3 }
        ));
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            percent_decode("%FF%FE").unwrap_err(),
            PercentError::InvalidUtf8
        ));
    }
}
