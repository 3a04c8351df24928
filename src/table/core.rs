//! Handler table core - registration and most-specific lookup.

use crate::dispatcher::RouteHandler;
use crate::matcher::{PathMatch, PathPattern, SchemaError, Specificity};
use crate::plugins::PluginRoute;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity of the party that owns a handler table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOwner {
    /// The host application
    Internal,
    /// An installed plugin, by name (e.g. `@acme/helm-tools`)
    Plugin(Arc<str>),
}

impl TableOwner {
    /// Owner for the named plugin
    pub fn plugin(name: impl Into<Arc<str>>) -> Self {
        TableOwner::Plugin(name.into())
    }

    /// Plugin name, or `None` for the internal table
    #[must_use]
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            TableOwner::Internal => None,
            TableOwner::Plugin(name) => Some(name.as_ref()),
        }
    }
}

impl fmt::Display for TableOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableOwner::Internal => f.write_str("internal"),
            TableOwner::Plugin(name) => write!(f, "plugin:{}", name),
        }
    }
}

/// One registered `(pattern, handler)` pair
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    pattern: PathPattern,
    handler: RouteHandler,
    seq: usize,
}

impl HandlerEntry {
    /// The compiled schema
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The handler to invoke on match
    #[inline]
    #[must_use]
    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// Registration order within the table (0 = first)
    #[inline]
    #[must_use]
    pub fn seq(&self) -> usize {
        self.seq
    }

    /// Ranking key: specificity first, then earlier registration
    fn rank(&self) -> (Specificity, Reverse<usize>) {
        (self.pattern.specificity(), Reverse(self.seq))
    }
}

/// The winning entry of a lookup together with what it captured
#[derive(Debug, Clone)]
pub struct TableMatch<'a> {
    /// The most specific matching entry
    pub entry: &'a HandlerEntry,
    /// Captured params and consumed segment count
    pub path_match: PathMatch,
}

/// Ordered handler collection for one owner
#[derive(Debug, Clone)]
pub struct HandlerTable {
    owner: TableOwner,
    entries: Vec<HandlerEntry>,
    next_seq: usize,
}

impl HandlerTable {
    /// Create an empty table
    #[must_use]
    pub fn new(owner: TableOwner) -> Self {
        Self {
            owner,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Create the empty application-level table
    #[must_use]
    pub fn internal() -> Self {
        Self::new(TableOwner::Internal)
    }

    /// Build a plugin's table from its current route list.
    ///
    /// Routes whose schema does not compile are skipped, leaving the plugin's other
    /// routes usable. The table is rebuilt per routing call, so the skip is only
    /// logged at debug level; `PluginRegistry::install` warns once.
    #[must_use]
    pub fn from_routes(owner: TableOwner, routes: &[PluginRoute]) -> Self {
        let mut table = Self::new(owner);
        for route in routes {
            if let Err(e) = table.register(&route.path_schema, route.handler.clone()) {
                debug!(
                    owner = %table.owner,
                    schema = %route.path_schema,
                    error = %e,
                    "Skipping plugin route with invalid schema"
                );
            }
        }
        table
    }

    /// Who owns this table
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &TableOwner {
        &self.owner
    }

    /// Number of registered entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered entries in registration order
    #[must_use]
    pub fn entries(&self) -> &[HandlerEntry] {
        &self.entries
    }

    /// Registered schemas in registration order
    #[must_use]
    pub fn schemas(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.pattern.schema().to_string())
            .collect()
    }

    /// Compile `schema` and add it with `handler`.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] if the schema is malformed; the table is left
    /// unchanged.
    pub fn register(&mut self, schema: &str, handler: RouteHandler) -> Result<(), SchemaError> {
        let pattern = PathPattern::compile(schema)?;
        self.insert(pattern, handler);
        Ok(())
    }

    /// Add an already compiled pattern
    pub fn insert(&mut self, pattern: PathPattern, handler: RouteHandler) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self
            .entries
            .iter()
            .any(|e| e.pattern.segments() == pattern.segments())
        {
            // The earlier entry keeps winning ties; the new one is unreachable.
            warn!(
                owner = %self.owner,
                schema = %pattern.schema(),
                "Schema shadowed by an earlier registration with the same segments"
            );
        }

        debug!(
            owner = %self.owner,
            schema = %pattern.schema(),
            specificity = ?pattern.specificity(),
            detached = handler.is_detached(),
            total_handlers = self.entries.len() + 1,
            "Handler registered"
        );

        self.entries.push(HandlerEntry {
            pattern,
            handler,
            seq,
        });
    }

    /// Find the most specific entry matching `path`.
    ///
    /// Returns `None` when no pattern matches.
    #[must_use]
    pub fn best_match<S: AsRef<str>>(&self, path: &[S]) -> Option<TableMatch<'_>> {
        let mut best: Option<TableMatch<'_>> = None;
        for entry in &self.entries {
            let Some(path_match) = entry.pattern.matches(path) else {
                continue;
            };
            let better = match &best {
                Some(current) => entry.rank() > current.entry.rank(),
                None => true,
            };
            if better {
                best = Some(TableMatch { entry, path_match });
            }
        }
        best
    }

    /// Log every registered schema at info level
    pub fn dump(&self) {
        info!(
            owner = %self.owner,
            count = self.entries.len(),
            schemas = ?self.schemas(),
            "Handler table"
        );
    }
}
