//! # Handler Table Module
//!
//! A [`HandlerTable`] is an ordered collection of `(pattern, handler)` pairs owned by
//! either the application itself ([`TableOwner::Internal`]) or one plugin
//! ([`TableOwner::Plugin`]).
//!
//! ## Lookup
//!
//! [`HandlerTable::best_match`] evaluates every entry against the request path,
//! keeps the ones that match and returns the most specific:
//!
//! 1. more pattern segments wins
//! 2. then more literal segments wins
//! 3. then the earliest registration wins
//!
//! With handlers for `/`, `/page` and `/page/:id`, the path `/page/foo/bar/bat`
//! selects `/page/:id` with `id = "foo"`. Adding `/page/foo` makes that entry win
//! instead, because it has one more literal segment.
//!
//! Lookup is a linear scan. Tables hold tens of entries, not thousands.
//!
//! ## Ownership
//!
//! The internal table lives for the whole process and is owned by the router.
//! Plugin tables are built per routing call from the plugin registry's current
//! snapshot ([`HandlerTable::from_routes`]), so disabling a plugin takes effect on
//! the very next call.

mod core;
#[cfg(test)]
mod tests;

pub use core::{HandlerEntry, HandlerTable, TableMatch, TableOwner};
