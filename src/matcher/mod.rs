//! # Matcher Module
//!
//! The matcher module turns path schemas such as `/page/:id` into compiled
//! [`PathPattern`]s and matches request path segments against them.
//!
//! ## Overview
//!
//! A schema is an ordered list of segments. Each segment is either:
//!
//! - a **literal** (`page`), compared by exact, case-sensitive string equality
//! - a **named parameter** (`:id`), which captures the request segment at that position
//!
//! Matching is prefix based: a pattern matches every path that *starts with* its
//! segments. Extra trailing segments are allowed and reported back as the unmatched
//! tail. A pattern longer than the path never matches.
//!
//! ## Specificity
//!
//! When several patterns match the same path, the [`Specificity`] of each pattern
//! decides which one wins:
//!
//! 1. more segments beats fewer segments
//! 2. on equal length, more literal segments beats fewer
//!
//! Any tie left after that is resolved by the handler table (earliest registration wins).
//!
//! ## Example
//!
//! ```rust
//! use protorouter::matcher::PathPattern;
//!
//! let pattern = PathPattern::compile("/page/:id").unwrap();
//! let m = pattern.matches(&["page", "foo", "bar"]).unwrap();
//! assert_eq!(m.get_param("id"), Some("foo"));
//! assert_eq!(m.consumed, 2);
//!
//! assert!(PathPattern::compile("/:@").is_err());
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    split_path, ParamVec, PathMatch, PathPattern, SchemaError, Segment, Specificity,
    MAX_INLINE_PARAMS,
};
