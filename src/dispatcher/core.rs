//! Dispatcher core - guarded handler invocation.

use crate::ids::RoutingId;
use crate::matcher::ParamVec;
use crate::runtime_config::RuntimeConfig;
use crate::table::TableOwner;
use may::coroutine;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Signature shared by every handler body
pub type HandlerFn = dyn Fn(HandlerRequest) -> anyhow::Result<()> + Send + Sync;

/// Request data passed to a handler
///
/// Built by the router after a successful match. Cloning is cheap apart from the
/// parameter values.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerRequest {
    /// Id of the routing call that produced this request
    pub routing_id: RoutingId,
    /// The raw URL as presented to the router
    pub url: Arc<str>,
    /// Table the matched handler belongs to
    pub owner: TableOwner,
    /// Schema of the matched handler (e.g. `/page/:id`)
    pub schema: Arc<str>,
    /// Parameters captured by the schema, in schema order
    pub path_params: ParamVec,
    /// Query string parameters, in URL order
    pub query_params: ParamVec,
    /// Path segments beyond the matched schema, joined with `/` (empty if none)
    pub tail: String,
}

impl HandlerRequest {
    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: `?tab=a&tab=b` returns `b`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to HashMap
    /// Note: This allocates - use get_path_param() for single lookups
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Convert query_params to HashMap
    /// Note: This allocates - use get_query_param() for single lookups
    #[must_use]
    pub fn query_params_map(&self) -> HashMap<String, String> {
        self.query_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A handler registered against a path schema
#[derive(Clone)]
pub enum RouteHandler {
    /// Runs to completion on the routing thread
    Inline(Arc<HandlerFn>),
    /// Spawned on a `may` coroutine; the routing call does not wait for it
    Detached(Arc<HandlerFn>),
}

impl RouteHandler {
    /// Wrap a closure as an inline handler
    pub fn inline<F>(handler_fn: F) -> Self
    where
        F: Fn(HandlerRequest) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        RouteHandler::Inline(Arc::new(handler_fn))
    }

    /// Wrap a closure as a detached (fire-and-forget) handler
    pub fn detached<F>(handler_fn: F) -> Self
    where
        F: Fn(HandlerRequest) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        RouteHandler::Detached(Arc::new(handler_fn))
    }

    /// Whether this handler runs on its own coroutine
    #[inline]
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(self, RouteHandler::Detached(_))
    }

    fn body(&self) -> &Arc<HandlerFn> {
        match self {
            RouteHandler::Inline(f) | RouteHandler::Detached(f) => f,
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHandler::Inline(_) => f.write_str("RouteHandler::Inline(..)"),
            RouteHandler::Detached(_) => f.write_str("RouteHandler::Detached(..)"),
        }
    }
}

/// What happened when a handler was invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Inline handler returned `Ok(())`
    Completed,
    /// Detached handler was started; its result is only logged
    Spawned,
    /// Inline handler returned an error, or the coroutine could not be spawned
    Failed(String),
    /// Inline handler panicked
    Panicked(String),
}

impl DispatchStatus {
    /// Whether the handler was started without a fault being observed
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchStatus::Completed | DispatchStatus::Spawned)
    }
}

/// Invokes handlers behind a catch boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    runtime: RuntimeConfig,
}

impl Dispatcher {
    /// Create a dispatcher with explicit runtime settings
    #[must_use]
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self { runtime }
    }

    /// Create a dispatcher configured from `PROTOROUTER_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RuntimeConfig::from_env())
    }

    /// Runtime settings in use
    #[must_use]
    pub fn runtime(&self) -> RuntimeConfig {
        self.runtime
    }

    /// Invoke `handler` with `request`.
    ///
    /// Never panics and never returns the handler's error: faults are logged and
    /// summarised in the returned [`DispatchStatus`].
    pub fn dispatch(&self, handler: &RouteHandler, request: HandlerRequest) -> DispatchStatus {
        match handler {
            RouteHandler::Inline(_) => run_guarded(handler.body(), request),
            RouteHandler::Detached(_) => self.spawn_detached(handler.body(), request),
        }
    }

    fn spawn_detached(&self, body: &Arc<HandlerFn>, request: HandlerRequest) -> DispatchStatus {
        let body = Arc::clone(body);
        let stack_size = self.runtime.stack_size;
        let routing_id = request.routing_id;
        let schema = Arc::clone(&request.schema);

        debug!(
            routing_id = %routing_id,
            schema = %schema,
            stack_size = stack_size,
            "Spawning detached handler"
        );

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
        // The closure is Send + 'static and owns everything it touches; faults are
        // caught inside the coroutine by run_guarded.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .name(format!("handler:{schema}"))
                .stack_size(stack_size)
                .spawn(move || {
                    let _ = run_guarded(&body, request);
                })
        };

        match spawn_result {
            Ok(_handle) => DispatchStatus::Spawned,
            Err(e) => {
                error!(
                    routing_id = %routing_id,
                    schema = %schema,
                    error = %e,
                    stack_size = stack_size,
                    "Failed to spawn handler coroutine"
                );
                DispatchStatus::Failed(e.to_string())
            }
        }
    }
}

fn run_guarded(body: &Arc<HandlerFn>, request: HandlerRequest) -> DispatchStatus {
    let routing_id = request.routing_id;
    let owner = request.owner.clone();
    let schema = Arc::clone(&request.schema);

    info!(
        routing_id = %routing_id,
        owner = %owner,
        schema = %schema,
        path_params = ?request.path_params,
        "Handler execution start"
    );

    let start = Instant::now();
    match catch_unwind(AssertUnwindSafe(|| body(request))) {
        Ok(Ok(())) => {
            info!(
                routing_id = %routing_id,
                owner = %owner,
                schema = %schema,
                execution_time_us = start.elapsed().as_micros() as u64,
                "Handler execution complete"
            );
            DispatchStatus::Completed
        }
        Ok(Err(e)) => {
            let message = format!("{e:#}");
            error!(
                routing_id = %routing_id,
                owner = %owner,
                schema = %schema,
                error = %message,
                "Handler returned an error"
            );
            DispatchStatus::Failed(message)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(
                routing_id = %routing_id,
                owner = %owner,
                schema = %schema,
                panic_message = %message,
                "Handler panicked"
            );
            DispatchStatus::Panicked(message)
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
