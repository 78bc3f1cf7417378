//! Path pattern compilation.
//!
//! A [`PathPattern`] turns a pattern string like `/users/{userId}/posts`
//! into a matcher that extracts named parameters from a concrete
//! request path. Literal runs are escaped so regex metacharacters in a
//! pattern (`.`, `+`, `(` and friends) only ever match themselves;
//! `{name}` placeholders match one or more non-`/` characters.
//!
//! Captured values are returned raw: percent escapes are deliberately
//! not decoded here, because whether to decode is a per-route policy
//! applied by the input decoder.

use regex::Regex;
use thiserror::Error;

/// An error compiling a path pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `{` placeholder was never closed.
    #[error("unclosed '{{' in pattern '{pattern}'")]
    UnclosedBrace {
        /// The offending pattern.
        pattern: String,
    },

    /// A placeholder has no name.
    #[error("empty placeholder name in pattern '{pattern}'")]
    EmptyName {
        /// The offending pattern.
        pattern: String,
    },

    /// The same parameter name appears twice.
    #[error("duplicate parameter '{name}' in pattern '{pattern}'")]
    DuplicateName {
        /// The offending pattern.
        pattern: String,
        /// The repeated parameter name.
        name: String,
    },

    /// The assembled expression failed to compile.
    #[error("pattern '{pattern}' did not compile")]
    Compile {
        /// The offending pattern.
        pattern: String,
        /// The regex engine's error.
        #[source]
        source: regex::Error,
    },
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a pattern string.
    ///
    /// ```
    /// use gatehouse_router::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/users/{id}").unwrap();
    /// assert_eq!(pattern.param_names(), ["id"]);
    ///
    /// let params = pattern.matches("/users/123").unwrap();
    /// assert_eq!(params, vec![("id".to_string(), "123".to_string())]);
    /// assert!(pattern.matches("/users").is_none());
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        let mut param_names = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| PatternError::UnclosedBrace {
                pattern: pattern.to_string(),
            })?;
            let name = &after[..close];
            if name.is_empty() {
                return Err(PatternError::EmptyName {
                    pattern: pattern.to_string(),
                });
            }
            if param_names.iter().any(|existing| existing == name) {
                return Err(PatternError::DuplicateName {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            expr.push_str(&regex::escape(&literal));
            literal.clear();
            expr.push_str("([^/]+)");
            param_names.push(name.to_string());
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| PatternError::Compile {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            param_names,
        })
    }

    /// Returns the original pattern string.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the placeholder names in order of appearance.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Matches a concrete path, returning `(name, raw value)` pairs in
    /// placeholder order, or `None` if the path does not match.
    ///
    /// Values are the raw matched substrings; percent escapes are not
    /// decoded.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.param_names
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, capture)| {
                    capture.map(|c| (name.clone(), c.as_str().to_string()))
                })
                .collect(),
        )
    }
}
