//! Router core - URL parsing, target classification and the routing pipeline.

use crate::config::RouterConfig;
use crate::dispatcher::{Dispatcher, HandlerRequest, RouteHandler};
use crate::ids::RoutingId;
use crate::matcher::{split_path, ParamVec, PathPattern, SchemaError};
use crate::plugins::PluginHandlerProvider;
use crate::reporter::{OutcomeReporter, OutcomeSink, RoutingOutcome};
use crate::table::{HandlerTable, TableOwner};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};
use url::Url;

/// A URL broken into the parts the router cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Lowercased scheme, without `://`
    pub scheme: String,
    /// Host as written, `None` when absent or empty
    pub host: Option<String>,
    /// Non-empty path segments, percent-decoded
    pub segments: Vec<String>,
    /// Query parameters in URL order, percent-decoded
    pub query: ParamVec,
}

impl ParsedUrl {
    /// Parse a raw URL string
    ///
    /// # Errors
    ///
    /// Returns the `url` crate's parse error for strings that are not absolute URLs.
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw)?;
        let segments = split_path(url.path())
            .into_iter()
            .map(decode_segment)
            .collect();
        let query = url
            .query_pairs()
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect();

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: url
                .host_str()
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            segments,
            query,
        })
    }
}

// Invalid UTF-8 after decoding keeps the raw segment
fn decode_segment(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Which table a URL addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// The application's own table; the whole path is matched
    Internal,
    /// A plugin's table; the first `consumed` segments named the plugin
    Plugin { name: String, consumed: usize },
}

impl RouteTarget {
    /// Classify by host. `None` means the URL has no valid target.
    ///
    /// Plugin names starting with `@` are scoped (`@scope/name`) and take two
    /// segments. Whether the plugin is enabled is checked later against the provider.
    #[must_use]
    pub fn classify(config: &RouterConfig, parsed: &ParsedUrl) -> Option<Self> {
        let host = parsed.host.as_deref()?;

        if host.eq_ignore_ascii_case(&config.internal_host) {
            return Some(RouteTarget::Internal);
        }
        if !host.eq_ignore_ascii_case(&config.extension_host) {
            return None;
        }

        let first = parsed.segments.first()?;
        if first.starts_with('@') {
            let second = parsed.segments.get(1)?;
            Some(RouteTarget::Plugin {
                name: format!("{}/{}", first, second),
                consumed: 2,
            })
        } else {
            Some(RouteTarget::Plugin {
                name: first.clone(),
                consumed: 1,
            })
        }
    }

    /// Index of the first segment that belongs to the routed path
    #[inline]
    #[must_use]
    pub fn path_offset(&self) -> usize {
        match self {
            RouteTarget::Internal => 0,
            RouteTarget::Plugin { consumed, .. } => *consumed,
        }
    }
}

/// Winning entry copied out of a table so no lock is held while the handler runs
struct Selected {
    handler: RouteHandler,
    schema: Arc<str>,
    params: ParamVec,
    consumed: usize,
}

fn select(table: &HandlerTable, path: &[String]) -> Option<Selected> {
    table.best_match(path).map(|m| Selected {
        handler: m.entry.handler().clone(),
        schema: m.entry.pattern().schema_arc(),
        params: m.path_match.params,
        consumed: m.path_match.consumed,
    })
}

/// Custom-protocol router
///
/// Owns the internal handler table and the outcome reporter; reads plugin routes
/// through a [`PluginHandlerProvider`]. Safe to share across threads behind an `Arc`.
pub struct ProtocolRouter {
    config: RouterConfig,
    internal: RwLock<HandlerTable>,
    plugins: Arc<dyn PluginHandlerProvider>,
    reporter: OutcomeReporter,
    dispatcher: Dispatcher,
}

impl fmt::Debug for ProtocolRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolRouter")
            .field("config", &self.config)
            .field("internal_schemas", &self.internal_schemas())
            .field("reporter", &self.reporter)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl ProtocolRouter {
    /// Create a router with an empty internal table.
    ///
    /// Detached handlers use the coroutine settings from `PROTOROUTER_STACK_SIZE`;
    /// see [`ProtocolRouter::with_dispatcher`] to set them explicitly.
    pub fn new(
        config: RouterConfig,
        plugins: Arc<dyn PluginHandlerProvider>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Router created with invalid configuration");
        }
        info!(
            scheme = %config.scheme,
            internal_host = %config.internal_host,
            extension_host = %config.extension_host,
            pending_policy = ?config.reporting.pending_policy,
            "Protocol router created"
        );
        let reporter = OutcomeReporter::new(sink, config.reporting.clone());
        Self {
            config,
            internal: RwLock::new(HandlerTable::internal()),
            plugins,
            reporter,
            dispatcher: Dispatcher::from_env(),
        }
    }

    /// Replace the dispatcher
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn reporter(&self) -> &OutcomeReporter {
        &self.reporter
    }

    /// Register an inline internal handler.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] for a malformed schema; nothing is registered.
    pub fn add_internal_handler<F>(&self, schema: &str, handler: F) -> Result<(), SchemaError>
    where
        F: Fn(HandlerRequest) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_internal_route(schema, RouteHandler::inline(handler))
    }

    /// Register an internal handler of either kind.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] for a malformed schema; nothing is registered.
    pub fn add_internal_route(&self, schema: &str, handler: RouteHandler) -> Result<(), SchemaError> {
        let pattern = match PathPattern::compile(schema) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!(schema = %schema, error = %e, "Internal handler rejected");
                return Err(e);
            }
        };

        let mut table = self.internal.write().unwrap_or_else(PoisonError::into_inner);
        table.insert(pattern, handler);
        info!(
            schema = %schema,
            total_handlers = table.len(),
            "Internal handler registered"
        );
        Ok(())
    }

    /// Internal schemas in registration order
    #[must_use]
    pub fn internal_schemas(&self) -> Vec<String> {
        self.internal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .schemas()
    }

    /// Log the internal table
    pub fn dump_internal(&self) {
        self.internal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dump();
    }

    /// Signal that the UI can receive outcomes. Returns `true` only the first time.
    pub fn set_ready(&self) -> bool {
        self.reporter.set_ready()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.reporter.is_ready()
    }

    /// Route one URL: run the most specific handler and report the outcome.
    ///
    /// Never fails and never panics because of a handler; the returned outcome is
    /// the one handed to the reporter.
    pub fn route(&self, raw_url: &str) -> RoutingOutcome {
        let routing_id = RoutingId::new();
        debug!(routing_id = %routing_id, url = %raw_url, "Routing attempt");

        let outcome = self.resolve(routing_id, raw_url);
        log_outcome(routing_id, &outcome);

        let status = self.reporter.report(outcome.clone());
        debug!(routing_id = %routing_id, status = ?status, "Outcome reported");
        outcome
    }

    fn resolve(&self, routing_id: RoutingId, raw_url: &str) -> RoutingOutcome {
        let parsed = match ParsedUrl::parse(raw_url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(routing_id = %routing_id, error = %e, "URL parse failed");
                return RoutingOutcome::InvalidProtocol {
                    url: raw_url.to_string(),
                };
            }
        };

        if !parsed.scheme.eq_ignore_ascii_case(&self.config.scheme) {
            debug!(
                routing_id = %routing_id,
                scheme = %parsed.scheme,
                expected = %self.config.scheme,
                "Scheme mismatch"
            );
            return RoutingOutcome::InvalidProtocol {
                url: raw_url.to_string(),
            };
        }

        let Some(target) = RouteTarget::classify(&self.config, &parsed) else {
            debug!(
                routing_id = %routing_id,
                host = ?parsed.host,
                "Host does not address a routing target"
            );
            return RoutingOutcome::InvalidHost {
                url: raw_url.to_string(),
            };
        };

        let path = &parsed.segments[target.path_offset()..];
        let (owner, selected) = match &target {
            RouteTarget::Internal => {
                let table = self.internal.read().unwrap_or_else(PoisonError::into_inner);
                (TableOwner::Internal, select(&table, path))
            }
            RouteTarget::Plugin { name, .. } => {
                let Some(routes) = self.plugins.handlers_for(name) else {
                    debug!(
                        routing_id = %routing_id,
                        plugin = %name,
                        "Plugin not installed or not enabled"
                    );
                    return RoutingOutcome::InvalidHost {
                        url: raw_url.to_string(),
                    };
                };
                let table = HandlerTable::from_routes(TableOwner::plugin(name.as_str()), &routes);
                let selected = select(&table, path);
                (table.owner().clone(), selected)
            }
        };

        let Some(selected) = selected else {
            return RoutingOutcome::NotMatched {
                url: raw_url.to_string(),
                owner,
            };
        };

        let request = HandlerRequest {
            routing_id,
            url: Arc::from(raw_url),
            owner: owner.clone(),
            schema: Arc::clone(&selected.schema),
            path_params: selected.params,
            query_params: parsed.query,
            tail: path[selected.consumed..].join("/"),
        };
        let status = self.dispatcher.dispatch(&selected.handler, request);
        debug!(routing_id = %routing_id, status = ?status, "Handler dispatched");

        RoutingOutcome::Matched {
            url: raw_url.to_string(),
            owner,
            schema: selected.schema.to_string(),
        }
    }
}

fn log_outcome(routing_id: RoutingId, outcome: &RoutingOutcome) {
    match outcome {
        RoutingOutcome::Matched { url, owner, schema } => info!(
            routing_id = %routing_id,
            url = %url,
            owner = %owner,
            schema = %schema,
            "Route matched"
        ),
        RoutingOutcome::NotMatched { url, owner } => warn!(
            routing_id = %routing_id,
            url = %url,
            owner = %owner,
            "No handler matched"
        ),
        RoutingOutcome::InvalidProtocol { url } => warn!(
            routing_id = %routing_id,
            url = %url,
            "Invalid protocol"
        ),
        RoutingOutcome::InvalidHost { url } => warn!(
            routing_id = %routing_id,
            url = %url,
            "Invalid host"
        ),
    }
}
