//! Matcher core - schema compilation and prefix matching.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Route schemas rarely carry more than two or three (`/cluster/:name/pod/:pod`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage.
///
/// Param names use `Arc<str>` because they come from the compiled pattern and are
/// shared by every match; values are per-call data taken from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Literal segments: URL "unreserved" characters only.
static LITERAL_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.~-]+$").expect("literal segment regex should be valid"));

/// Parameter names (the part after `:`).
static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("param name regex should be valid"));

/// Error returned when a path schema cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema does not start with `/`
    MissingLeadingSlash {
        /// The rejected schema
        schema: String,
    },
    /// The schema contains an empty segment (`/a//b`)
    EmptySegment {
        /// The rejected schema
        schema: String,
        /// Zero-based index of the empty segment
        index: usize,
    },
    /// A segment contains a character that is not allowed in a schema
    IllegalCharacter {
        /// The rejected schema
        schema: String,
        /// The offending segment
        segment: String,
    },
    /// A `.` or `..` segment, which URL normalisation removes before routing
    DotSegment {
        /// The rejected schema
        schema: String,
    },
    /// A bare `:` with no parameter name
    EmptyParamName {
        /// The rejected schema
        schema: String,
    },
    /// The same parameter name appears twice
    DuplicateParam {
        /// The rejected schema
        schema: String,
        /// The repeated name
        name: String,
    },
}

impl SchemaError {
    /// The schema string that failed to compile
    #[must_use]
    pub fn schema(&self) -> &str {
        match self {
            SchemaError::MissingLeadingSlash { schema }
            | SchemaError::EmptySegment { schema, .. }
            | SchemaError::IllegalCharacter { schema, .. }
            | SchemaError::DotSegment { schema }
            | SchemaError::EmptyParamName { schema }
            | SchemaError::DuplicateParam { schema, .. } => schema,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::MissingLeadingSlash { schema } => {
                write!(f, "invalid path schema '{}': must start with '/'", schema)
            }
            SchemaError::EmptySegment { schema, index } => {
                write!(
                    f,
                    "invalid path schema '{}': segment {} is empty",
                    schema, index
                )
            }
            SchemaError::IllegalCharacter { schema, segment } => {
                write!(
                    f,
                    "invalid path schema '{}': illegal character in segment '{}' \
                    (allowed: A-Z a-z 0-9 _ - . ~, or ':' followed by a name)",
                    schema, segment
                )
            }
            SchemaError::DotSegment { schema } => {
                write!(
                    f,
                    "invalid path schema '{}': '.' and '..' segments are not routable",
                    schema
                )
            }
            SchemaError::EmptyParamName { schema } => {
                write!(f, "invalid path schema '{}': parameter has no name", schema)
            }
            SchemaError::DuplicateParam { schema, name } => {
                write!(
                    f,
                    "invalid path schema '{}': parameter ':{}' appears more than once",
                    schema, name
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// One compiled schema segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly
    Literal(Arc<str>),
    /// Captures the request segment under this name
    Param(Arc<str>),
}

impl Segment {
    /// Whether this is a literal segment
    #[inline]
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

/// Ranking of a pattern among other matching patterns.
///
/// Ordered lexicographically: segment count first, then literal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    /// Total number of segments in the pattern
    pub segments: usize,
    /// Number of literal (non-parameter) segments
    pub literals: usize,
}

/// Result of matching a path against a [`PathPattern`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Captured parameters in schema order
    pub params: ParamVec,
    /// Number of leading path segments consumed by the pattern
    pub consumed: usize,
}

impl PathMatch {
    /// Get a captured parameter by name
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a HashMap
    /// Note: This allocates - use get_param() when a single value is needed
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A compiled path schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    schema: Arc<str>,
    segments: Vec<Segment>,
    specificity: Specificity,
}

impl PathPattern {
    /// Compile a path schema such as `/page/:id`.
    ///
    /// `/` compiles to the root pattern, which matches every path. A single
    /// trailing `/` is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when the schema is malformed: missing leading
    /// slash, empty interior segment, illegal character (e.g. `@`), `.`/`..`
    /// segment, nameless or repeated parameter.
    pub fn compile(schema: &str) -> Result<Self, SchemaError> {
        let body = schema
            .strip_prefix('/')
            .ok_or_else(|| SchemaError::MissingLeadingSlash {
                schema: schema.to_string(),
            })?;
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut segments = Vec::new();
        if !body.is_empty() {
            for (index, raw) in body.split('/').enumerate() {
                segments.push(Self::compile_segment(schema, index, raw, &segments)?);
            }
        }

        let literals = segments.iter().filter(|s| s.is_literal()).count();
        let specificity = Specificity {
            segments: segments.len(),
            literals,
        };

        Ok(Self {
            schema: Arc::from(schema),
            segments,
            specificity,
        })
    }

    fn compile_segment(
        schema: &str,
        index: usize,
        raw: &str,
        seen: &[Segment],
    ) -> Result<Segment, SchemaError> {
        if raw.is_empty() {
            return Err(SchemaError::EmptySegment {
                schema: schema.to_string(),
                index,
            });
        }

        if let Some(name) = raw.strip_prefix(':') {
            if name.is_empty() {
                return Err(SchemaError::EmptyParamName {
                    schema: schema.to_string(),
                });
            }
            if !PARAM_NAME.is_match(name) {
                return Err(SchemaError::IllegalCharacter {
                    schema: schema.to_string(),
                    segment: raw.to_string(),
                });
            }
            let duplicate = seen
                .iter()
                .any(|s| matches!(s, Segment::Param(existing) if existing.as_ref() == name));
            if duplicate {
                return Err(SchemaError::DuplicateParam {
                    schema: schema.to_string(),
                    name: name.to_string(),
                });
            }
            return Ok(Segment::Param(Arc::from(name)));
        }

        if raw == "." || raw == ".." {
            return Err(SchemaError::DotSegment {
                schema: schema.to_string(),
            });
        }
        if !LITERAL_SEGMENT.is_match(raw) {
            return Err(SchemaError::IllegalCharacter {
                schema: schema.to_string(),
                segment: raw.to_string(),
            });
        }
        Ok(Segment::Literal(Arc::from(raw)))
    }

    /// The schema string this pattern was compiled from
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Shared handle to the schema string
    #[inline]
    #[must_use]
    pub fn schema_arc(&self) -> Arc<str> {
        Arc::clone(&self.schema)
    }

    /// Compiled segments in order
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Ranking used to pick among several matching patterns
    #[inline]
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Match request path segments against this pattern.
    ///
    /// Returns `None` if the path is shorter than the pattern or any literal
    /// differs. Trailing path segments beyond the pattern are ignored.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> Option<PathMatch> {
        if path.len() < self.segments.len() {
            return None;
        }

        let mut params = ParamVec::new();
        for (segment, actual) in self.segments.iter().zip(path) {
            let actual = actual.as_ref();
            match segment {
                Segment::Literal(expected) => {
                    if expected.as_ref() != actual {
                        return None;
                    }
                }
                Segment::Param(name) => params.push((Arc::clone(name), actual.to_string())),
            }
        }

        Some(PathMatch {
            params,
            consumed: self.segments.len(),
        })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.schema)
    }
}

/// Split a request path into its non-empty segments.
///
/// Repeated and trailing slashes do not produce empty segments:
/// `"/page//foo/"` yields `["page", "foo"]`.
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
